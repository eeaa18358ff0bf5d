//! `t3` - operator CLI for T3 containers.
//!
//! - `t3 info <file>` - report a container's header and stream inventory
//! - `t3 dump <file>` - raw-stream diagnostics (CRC-12/0x80F, ternary parity)
//! - `t3 export-bal <file> --out <bin>` - balanced trit stream as bytes
//! - `t3 export-unb <file> --out <bin>` - unbalanced trit stream as bytes
//! - `t3 repack <in> --to {packed|balanced} --out <file>` - stream conversion
//! - `t3 cat --out <merged> <a> <b> ...` - concatenate `.t3proto` files
//!
//! Exit codes: 0 success, 1 I/O or integrity failure, 2 usage error.

#![forbid(unsafe_code)]

mod cat;
mod dump;
mod export;
mod info;
mod repack;

use clap::{Parser, Subcommand};

/// T3 container tooling.
#[derive(Parser)]
#[command(name = "t3")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a container's header fields and stream inventory.
    ///
    /// Understands `.t3p`, `.t3v`, and `.t3proto` by extension. With
    /// `--json` the report is machine-readable.
    Info(info::InfoArgs),

    /// Raw-stream diagnostics for `.t3p` / `.t3v` payloads.
    ///
    /// Prints CRC-12 (poly 0x80F) and ternary parity (Σ byte mod 3) over the
    /// raw Word27 bytes, per frame.
    Dump(dump::DumpArgs),

    /// Export the balanced trit stream of a `.t3proto` file as one signed
    /// byte per trit.
    ExportBal(export::ExportArgs),

    /// Export the unbalanced trit stream of a `.t3proto` file as one byte
    /// per trit.
    ExportUnb(export::ExportArgs),

    /// Rewrite a `.t3proto` carrying the requested stream form.
    ///
    /// `--to packed` derives the base-243 stream; `--to balanced` expands
    /// it back (using `--n-trits` or `--guess` when only packed bytes are
    /// present).
    Repack(repack::RepackArgs),

    /// Concatenate `.t3proto` files with matching profile and dimensions.
    Cat(cat::CatArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for reports and JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info(args) => info::run(&args),
        Commands::Dump(args) => dump::run(&args),
        Commands::ExportBal(args) => export::run(&args, export::Form::Balanced),
        Commands::ExportUnb(args) => export::run(&args, export::Form::Unbalanced),
        Commands::Repack(args) => repack::run(&args),
        Commands::Cat(args) => cat::run(&args),
    }
}
