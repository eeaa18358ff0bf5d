//! `t3 export-bal` / `t3 export-unb` - trit stream extraction.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use t3_container::t3proto_read;
use t3_trit::{bal_to_unb, unpack_base243};

/// Arguments shared by the export commands.
#[derive(Args)]
pub struct ExportArgs {
    /// Source `.t3proto` file.
    pub file: PathBuf,

    /// Destination binary file, one byte per trit.
    #[arg(long)]
    pub out: PathBuf,
}

/// Which trit alphabet to emit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// Balanced trits as signed bytes (-1, 0, +1).
    Balanced,
    /// Unbalanced trits as bytes (0, 1, 2).
    Unbalanced,
}

pub fn run(args: &ExportArgs, form: Form) -> Result<()> {
    let proto = t3proto_read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    // Prefer the balanced stream; otherwise expand the packed one.
    let unb: Vec<u8> = if let Some(bal) = &proto.balanced {
        bal.iter().map(|&b| bal_to_unb(b)).collect()
    } else if let Some(packed) = &proto.packed {
        unpack_base243(packed, proto.n_trits as usize)
            .with_context(|| format!("unpacking {} trits", proto.n_trits))?
    } else {
        bail!("{} carries neither balanced nor packed trits", args.file.display());
    };

    let bytes: Vec<u8> = match form {
        Form::Unbalanced => unb,
        Form::Balanced => unb
            .into_iter()
            .map(|u| (i16::from(u) - 1) as i8 as u8)
            .collect(),
    };
    fs::write(&args.out, &bytes)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("exported {} trits -> {}", bytes.len(), args.out.display());
    Ok(())
}
