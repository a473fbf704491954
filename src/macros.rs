// src/macros.rs

#[macro_export]
macro_rules! s {
    // String shorthand!
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! record {
    // Record literal shorthand: record! { "site" => "Missoula", "aqi" => 42 }
    () => {
        $crate::record::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut r = $crate::record::Record::new();
        $(
            r.insert($key, $value);
        )+
        r
    }};
}
