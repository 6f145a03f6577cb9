//! Backward-scanning tail reader
//!
//! Returns the last N lines of a seekable source without reading the whole
//! thing. The result is always identical to splitting the full content on
//! `\n` (ignoring a single final terminator) and taking the last N pieces.

use std::io::{self, Read, Seek, SeekFrom};

/// Chunk size for a tail request
///
/// Small requests read small chunks. This only affects how many reads are
/// issued, never the result.
pub fn chunk_size(max_lines: usize) -> usize {
    if max_lines < 2 {
        64
    } else if max_lines < 10 {
        512
    } else {
        4096
    }
}

/// Read the last `max_lines` lines of `source`, most recent last
///
/// Lines are returned without their terminators. An empty source yields no
/// lines; a final line without a terminator counts as a line.
pub fn tail_lines<R: Read + Seek>(source: &mut R, max_lines: usize) -> io::Result<Vec<Vec<u8>>> {
    let len = source.seek(SeekFrom::End(0))?;
    if len == 0 || max_lines == 0 {
        return Ok(Vec::new());
    }

    // Only bytes below the length seen here are read, so concurrent appends
    // are simply not visible to this call.
    let mut last = [0u8; 1];
    source.seek(SeekFrom::Start(len - 1))?;
    source.read_exact(&mut last)?;
    let body_end = if last[0] == b'\n' { len - 1 } else { len };

    let chunk = chunk_size(max_lines) as u64;
    let mut pos = body_end;
    let mut buf: Vec<u8> = Vec::new();
    let mut newlines = 0usize;
    let mut start_in_buf: Option<usize> = None;

    // Collect chunks until the max_lines-th separator from the end is found
    while pos > 0 {
        let read_len = chunk.min(pos);
        pos -= read_len;

        let mut block = vec![0u8; read_len as usize];
        source.seek(SeekFrom::Start(pos))?;
        source.read_exact(&mut block)?;

        if let Some(offset) = nth_newline_from_end(&block, max_lines - newlines) {
            start_in_buf = Some(offset + 1);
            block.extend_from_slice(&buf);
            buf = block;
            break;
        }

        newlines += block.iter().filter(|&&b| b == b'\n').count();
        block.extend_from_slice(&buf);
        buf = block;
    }

    let body = &buf[start_in_buf.unwrap_or(0)..];
    Ok(body.split(|&b| b == b'\n').map(<[u8]>::to_vec).collect())
}

/// Read the last `max_lines` lines as strings, replacing invalid UTF-8
pub fn tail_strings<R: Read + Seek>(source: &mut R, max_lines: usize) -> io::Result<Vec<String>> {
    Ok(tail_lines(source, max_lines)?
        .into_iter()
        .map(|line| String::from_utf8_lossy(&line).into_owned())
        .collect())
}

/// Index of the `n`-th `\n` counting backward from the end of `block`
fn nth_newline_from_end(block: &[u8], n: usize) -> Option<usize> {
    block
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, b)| **b == b'\n')
        .nth(n.checked_sub(1)?)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Whole-content reference the backward scan must agree with
    fn reference(content: &[u8], n: usize) -> Vec<Vec<u8>> {
        if content.is_empty() {
            return Vec::new();
        }
        let body = content.strip_suffix(b"\n").unwrap_or(content);
        let lines: Vec<Vec<u8>> = body.split(|&b| b == b'\n').map(<[u8]>::to_vec).collect();
        let skip = lines.len().saturating_sub(n);
        lines.into_iter().skip(skip).collect()
    }

    fn check(content: &[u8], n: usize) {
        let got = tail_lines(&mut Cursor::new(content.to_vec()), n).unwrap();
        assert_eq!(got, reference(content, n), "n={} len={}", n, content.len());
    }

    fn numbered(count: usize, trailing: bool) -> Vec<u8> {
        let mut s = (0..count)
            .map(|i| format!("2025-01-09 12:00:00 +0000, 10.0.{}.{}, line {}", i / 256, i % 256, i))
            .collect::<Vec<_>>()
            .join("\n");
        if trailing && count > 0 {
            s.push('\n');
        }
        s.into_bytes()
    }

    #[test]
    fn test_empty_source() {
        assert!(tail_lines(&mut Cursor::new(Vec::new()), 5).unwrap().is_empty());
        assert!(tail_lines(&mut Cursor::new(b"abc\n".to_vec()), 0).unwrap().is_empty());
    }

    #[test]
    fn test_single_line() {
        check(b"only\n", 1);
        check(b"only", 1);
        check(b"only", 3);
        check(b"\n", 1);
        check(b"\n\n\n", 2);
    }

    #[test]
    fn test_partial_final_line_counts() {
        let got = tail_lines(&mut Cursor::new(b"a\nb\npartial".to_vec()), 2).unwrap();
        assert_eq!(got, vec![b"b".to_vec(), b"partial".to_vec()]);
    }

    #[test]
    fn test_boundaries_around_n() {
        for &n in &[1usize, 2, 9, 10, 11, 50] {
            for &count in &[n.saturating_sub(1), n, n + 1] {
                check(&numbered(count, true), n);
                check(&numbered(count, false), n);
            }
        }
    }

    #[test]
    fn test_thousands_of_lines() {
        let content = numbered(5000, true);
        for &n in &[1usize, 7, 50, 999, 4999, 5000, 6000] {
            check(&content, n);
        }
        check(&numbered(5000, false), 123);
    }

    #[test]
    fn test_lines_longer_than_chunk() {
        let long = "x".repeat(10_000);
        let content = format!("{long}\nshort\n{long}y\n");
        check(content.as_bytes(), 1);
        check(content.as_bytes(), 2);
        check(content.as_bytes(), 3);
        check(content.as_bytes(), 4);
    }

    #[test]
    fn test_chunk_size_policy() {
        assert_eq!(chunk_size(1), 64);
        assert_eq!(chunk_size(5), 512);
        assert_eq!(chunk_size(50), 4096);
    }
}
