//! `t3 info` - container header reports.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use t3_container::{t3p_read_header, t3proto_read, t3v_read_header};

/// Arguments for `t3 info`.
#[derive(Args)]
pub struct InfoArgs {
    /// Container file (`.t3p`, `.t3v`, or `.t3proto`).
    pub file: PathBuf,

    /// Emit a JSON report instead of text.
    #[arg(long)]
    pub json: bool,
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let report = match extension(&args.file).as_str() {
        "t3p" => {
            let h = t3p_read_header(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            json!({
                "format": "t3p",
                "subword": format!("S{}", h.subword.payload_trits()),
                "width": h.width,
                "height": h.height,
                "words": h.words_count,
                "meta_len": h.meta.len(),
            })
        }
        "t3v" => {
            let h = t3v_read_header(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            let frames: Vec<_> = h
                .index
                .iter()
                .map(|e| json!({"offset": e.offset, "words": e.words, "meta_len": e.meta_len}))
                .collect();
            json!({
                "format": "t3v",
                "subword": format!("S{}", h.subword.payload_trits()),
                "width": h.width,
                "height": h.height,
                "frame_count": h.frame_count,
                "global_meta_len": h.global_meta.len(),
                "frames": frames,
            })
        }
        "t3proto" => {
            let p = t3proto_read(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            json!({
                "format": "t3proto",
                "profile": format!("{:?}", p.profile),
                "width": p.width,
                "height": p.height,
                "n_trits": p.n_trits,
                "balanced": p.balanced.as_ref().map_or(0, Vec::len),
                "packed_bytes": p.packed.as_ref().map_or(0, Vec::len),
                "meta_len": p.meta.len(),
            })
        }
        other => bail!("unknown container extension {other:?} (expected t3p, t3v, or t3proto)"),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(map) = report.as_object() {
        for (key, value) in map {
            println!("{key}: {value}");
        }
    }
    Ok(())
}
