//! `t3 dump` - raw-stream diagnostics for `.t3p` / `.t3v` payloads.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use t3_container::{t3p_read_payload, t3v_read_frame, t3v_read_header};

/// Arguments for `t3 dump`.
#[derive(Args)]
pub struct DumpArgs {
    /// Container file (`.t3p` or `.t3v`).
    pub file: PathBuf,
}

/// Binary CRC-12 with polynomial 0x80F over raw bytes, MSB-first.
pub(crate) fn crc12_0x80f(data: &[u8]) -> u16 {
    let poly: u16 = 0x80F;
    let mut crc: u16 = 0;
    for &byte in data {
        for bit in (0..8).rev() {
            let inb = u16::from((byte >> bit) & 1);
            let msb = (crc >> 11) & 1;
            crc <<= 1;
            if msb ^ inb != 0 {
                crc ^= poly;
            }
            crc &= 0x0FFF;
        }
    }
    crc & 0x0FFF
}

/// Ternary parity: Σ (byte mod 3) mod 3.
pub(crate) fn parity_mod3(data: &[u8]) -> u8 {
    (data.iter().map(|&b| u32::from(b % 3)).sum::<u32>() % 3) as u8
}

fn dump_frame(label: &str, words: &[t3_codec::Word27]) {
    let raw: Vec<u8> = words.iter().flat_map(|w| w.syms).collect();
    println!(
        "{label}: words={} crc12(raw)=0x{:03X} parity3(raw)={}",
        words.len(),
        crc12_0x80f(&raw),
        parity_mod3(&raw)
    );
}

pub fn run(args: &DumpArgs) -> Result<()> {
    let ext = args
        .file
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "t3p" => {
            let words = t3p_read_payload(&args.file, |_| true)
                .with_context(|| format!("reading {}", args.file.display()))?;
            dump_frame("frame 0", &words);
        }
        "t3v" => {
            let header = t3v_read_header(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            for i in 0..header.frame_count {
                let words = t3v_read_frame(&args.file, i, |_| true)
                    .with_context(|| format!("frame {i} of {}", args.file.display()))?;
                dump_frame(&format!("frame {i}"), &words);
            }
        }
        other => bail!("dump expects a .t3p or .t3v file, got {other:?}"),
    }
    Ok(())
}
