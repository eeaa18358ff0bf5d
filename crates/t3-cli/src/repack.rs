//! `t3 repack` - convert a `.t3proto` between packed and balanced forms.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use t3_container::{infer_n_trits, t3proto_read, t3proto_write, T3Proto};
use t3_trit::{pack_base243_balanced, unpack_base243_balanced};

/// Target stream form.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Base-243 packed bytes.
    Packed,
    /// Balanced trits.
    Balanced,
}

/// Arguments for `t3 repack`.
#[derive(Args)]
pub struct RepackArgs {
    /// Source `.t3proto` file.
    pub file: PathBuf,

    /// Stream form the output must carry.
    #[arg(long, value_enum)]
    pub to: Target,

    /// Destination `.t3proto` file.
    #[arg(long)]
    pub out: PathBuf,

    /// Also keep the balanced stream when repacking to packed.
    #[arg(long)]
    pub keep_balanced: bool,

    /// Also keep the packed stream when expanding to balanced.
    #[arg(long)]
    pub keep_packed: bool,

    /// Exact trit count to use when only packed bytes are present.
    #[arg(long)]
    pub n_trits: Option<u64>,

    /// Infer the trit count from meta counters when only packed bytes are
    /// present.
    #[arg(long)]
    pub guess: bool,
}

pub fn run(args: &RepackArgs) -> Result<()> {
    let proto = t3proto_read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    let out = match args.to {
        Target::Packed => {
            let Some(bal) = &proto.balanced else {
                bail!(
                    "{} has no balanced stream to pack (try --to balanced first)",
                    args.file.display()
                );
            };
            T3Proto {
                packed: Some(pack_base243_balanced(bal)),
                balanced: args.keep_balanced.then(|| bal.clone()),
                ..proto.clone()
            }
        }
        Target::Balanced => {
            if let Some(bal) = &proto.balanced {
                // Already balanced; optionally drop the packed stream.
                T3Proto {
                    balanced: Some(bal.clone()),
                    packed: args.keep_packed.then(|| proto.packed.clone()).flatten(),
                    ..proto.clone()
                }
            } else {
                let Some(packed) = &proto.packed else {
                    bail!("{} carries no streams at all", args.file.display());
                };
                let n = match (args.n_trits, args.guess) {
                    (Some(n), _) => n,
                    (None, true) => {
                        infer_n_trits(proto.width, proto.height, &proto.meta, packed.len() as u64)
                    }
                    (None, false) if proto.n_trits > 0 => proto.n_trits,
                    _ => bail!("trit count unknown; pass --n-trits or --guess"),
                };
                let bal = unpack_base243_balanced(packed, n as usize)
                    .with_context(|| format!("unpacking {n} trits"))?;
                T3Proto {
                    balanced: Some(bal),
                    packed: args.keep_packed.then(|| packed.clone()),
                    ..proto.clone()
                }
            }
        }
    };

    t3proto_write(&args.out, &out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("repacked {} -> {}", args.file.display(), args.out.display());
    Ok(())
}
