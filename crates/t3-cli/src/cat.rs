//! `t3 cat` - concatenate `.t3proto` files.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use t3_container::{t3proto_read, t3proto_write, T3Proto};

/// Arguments for `t3 cat`.
#[derive(Args)]
pub struct CatArgs {
    /// Destination `.t3proto` file.
    #[arg(long)]
    pub out: PathBuf,

    /// Input files, in order. Profiles and dimensions must match.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Fail unless every input carries a balanced stream.
    #[arg(long)]
    pub require_balanced: bool,

    /// Fail unless every input carries a packed stream.
    #[arg(long)]
    pub require_packed: bool,
}

pub fn run(args: &CatArgs) -> Result<()> {
    let mut merged = T3Proto::default();
    let mut bal_cat: Vec<i8> = Vec::new();
    let mut pack_cat: Vec<u8> = Vec::new();
    let mut all_bal = true;
    let mut all_pack = true;
    let mut manifest = String::from("{\"concat\":[");

    for (i, path) in args.inputs.iter().enumerate() {
        let proto =
            t3proto_read(path).with_context(|| format!("reading {}", path.display()))?;
        if i == 0 {
            merged.profile = proto.profile;
            merged.width = proto.width;
            merged.height = proto.height;
        } else if proto.profile != merged.profile
            || proto.width != merged.width
            || proto.height != merged.height
        {
            bail!(
                "incompatible input {}: profile or dimensions differ",
                path.display()
            );
        }

        let n_bal = proto.balanced.as_ref().map_or(0, Vec::len);
        let n_pack = proto.packed.as_ref().map_or(0, Vec::len);
        all_bal &= n_bal > 0;
        all_pack &= n_pack > 0;
        if let Some(bal) = proto.balanced {
            bal_cat.extend(bal);
        }
        if let Some(packed) = proto.packed {
            pack_cat.extend(packed);
        }

        if i > 0 {
            manifest.push(',');
        }
        let _ = write!(
            manifest,
            "{{\"file\":{:?},\"trits\":{n_bal},\"bytes\":{n_pack}}}",
            path.display().to_string()
        );
    }
    manifest.push_str("]}");

    if args.require_balanced && !all_bal {
        bail!("--require-balanced: at least one input is missing balanced trits");
    }
    if args.require_packed && !all_pack {
        bail!("--require-packed: at least one input is missing packed bytes");
    }

    merged.meta = manifest;
    merged.balanced = all_bal.then_some(bal_cat);
    merged.packed = all_pack.then_some(pack_cat);

    t3proto_write(&args.out, &merged)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!(
        "concatenated {} files -> {}",
        args.inputs.len(),
        args.out.display()
    );
    Ok(())
}
