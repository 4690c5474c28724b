//! Image files
//!
//! Loading and saving raw flash images, and hex dumps for inspection.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::format::ERASED_BYTE;

const HEXDUMP_WIDTH: usize = 16;

/// Read an image file
pub fn load(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Write an image file, replacing any existing one
pub fn save(path: &Path, image: &[u8]) -> Result<()> {
    fs::write(path, image)?;
    Ok(())
}

/// An erased image of `size` bytes
pub fn blank(size: usize) -> Vec<u8> {
    vec![ERASED_BYTE; size]
}

/// Render `bytes` in canonical hex+ASCII layout
///
/// Runs of identical lines collapse into a single `*`, and the dump ends
/// with the total length as an offset line.
pub fn hexdump(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut previous: Option<&[u8]> = None;
    let mut collapsed = false;

    for (index, line) in bytes.chunks(HEXDUMP_WIDTH).enumerate() {
        if line.len() == HEXDUMP_WIDTH && previous == Some(line) {
            if !collapsed {
                out.push_str("*\n");
                collapsed = true;
            }
            continue;
        }
        collapsed = false;
        previous = Some(line);

        let _ = write!(out, "{:08x} ", index * HEXDUMP_WIDTH);
        for i in 0..HEXDUMP_WIDTH {
            if i % 8 == 0 {
                out.push(' ');
            }
            match line.get(i) {
                Some(b) => {
                    let _ = write!(out, "{:02x} ", b);
                }
                None => out.push_str("   "),
            }
        }
        out.push_str(" |");
        out.extend(line.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    if !bytes.is_empty() {
        let _ = writeln!(out, "{:08x}", bytes.len());
    }
    out
}
