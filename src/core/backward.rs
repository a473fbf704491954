// src/core/backward.rs
// Read the lines of a seekable byte source from the last line to the first.
// Lines keep their trailing '\n'; only the final line of the source may lack one.
// Knows nothing about what the lines contain.

use std::io::{self, Read, Seek, SeekFrom};

const CHUNK: usize = 8 * 1024;

pub struct BackwardLines<R> {
    reader: R,
    pos: u64,      // source offset of buf[0]
    buf: Vec<u8>,  // bytes [pos, end of the next line to emit)
    chunk: usize,
    failed: bool,
}

/// Shorthand for [`BackwardLines::new`].
pub fn read_backward<R: Read + Seek>(reader: R) -> io::Result<BackwardLines<R>> {
    BackwardLines::new(reader)
}

impl<R: Read + Seek> BackwardLines<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_chunk_size(reader, CHUNK)
    }

    pub fn with_chunk_size(mut reader: R, chunk: usize) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self { reader, pos: len, buf: Vec::new(), chunk: chunk.max(1), failed: false })
    }

    /// Pull the chunk just before `pos` in front of `buf`.
    fn fill(&mut self) -> io::Result<()> {
        let n = (self.chunk as u64).min(self.pos) as usize;
        let start = self.pos - n as u64;
        self.reader.seek(SeekFrom::Start(start))?;

        let mut joined = vec![0u8; n + self.buf.len()];
        self.reader.read_exact(&mut joined[..n])?;
        joined[n..].copy_from_slice(&self.buf);

        self.buf = joined;
        self.pos = start;
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            // The last byte of buf may be the line's own terminator; the line
            // starts after the previous '\n'.
            let body = self.buf.len().saturating_sub(1);
            if let Some(i) = self.buf[..body].iter().rposition(|&b| b == b'\n') {
                return Ok(Some(self.buf.split_off(i + 1)));
            }
            if self.pos == 0 {
                if self.buf.is_empty() { return Ok(None); }
                return Ok(Some(std::mem::take(&mut self.buf)));
            }
            self.fill()?;
        }
    }
}

impl<R: Read + Seek> Iterator for BackwardLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed { return None; }
        match self.next_line() {
            Ok(Some(bytes)) => Some(
                String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            ),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
