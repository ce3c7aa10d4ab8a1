use anyhow::{bail, ensure, Context};
use clap::{crate_version, Parser, Subcommand};
use rand::rngs::OsRng;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use shamir::config::ShamirConfig;
use shamir::constants::DEFAULT_CONFIG_PATH;
use shamir::files::{ensure_writable, find_share_files, read_lines, share_file_name, write_private};
use shamir::share::render_clean;
use shamir::sss::{combine, combine_shares, new_share_token, split_secret, SplitConfig};

/// Exit code for any failure.
const EXIT_FAILURE: i32 = 11;

#[derive(Debug, Subcommand)]
enum CliArgument {
    /// Split a secret into shares. The secret is read from FILE, or from standard input until
    /// an empty line.
    Split {
        /// Share threshold. Defaults to the configured threshold.
        #[clap(long, short)]
        threshold: Option<usize>,

        /// Number of shares to generate. Defaults to the configured share count.
        #[clap(long, short)]
        shares: Option<usize>,

        /// File holding the secret.
        file: Option<PathBuf>,

        /// Write shares to files named PREFIX-N. Shares are not printed unless --print is given.
        #[clap(long)]
        out: Option<String>,

        /// Write shares in the clean, printable layout to files named PREFIX-N.
        #[clap(long)]
        out_clean: Option<String>,

        /// Replace existing files. Old share files beyond the new share count are left in place.
        #[clap(long)]
        overwrite: bool,

        /// Print shares even when writing them to files.
        #[clap(long, short)]
        print: bool,

        /// Print shares in the clean, printable layout. Implies --print.
        #[clap(long, short)]
        clean: bool,
    },
    /// Combine shares into the secret. Shares are read from files PREFIX-N, or from standard
    /// input one per line until an empty line.
    Combine {
        /// Prefix of the share files.
        prefix: Option<String>,

        /// Directory holding the share files.
        #[clap(long, short, default_value = ".")]
        dir: PathBuf,

        /// Write the secret to FILE, or to a file named after PREFIX when no FILE is given.
        #[clap(long, num_args = 0..=1)]
        out: Option<Option<String>>,

        /// Directory for the output file.
        #[clap(long)]
        out_dir: Option<PathBuf>,

        /// Replace an existing output file.
        #[clap(long)]
        overwrite: bool,

        /// Print the secret even when writing it to a file.
        #[clap(long, short)]
        print: bool,
    },
    /// Derive the share with a new id from at least threshold existing shares.
    NewShare {
        /// Id of the share to create, 1 to 255.
        #[clap(long, short)]
        id: usize,

        /// Prefix of the existing share files.
        prefix: Option<String>,

        /// Directory holding the share files.
        #[clap(long, short, default_value = ".")]
        dir: PathBuf,

        /// Write the new share to the file PREFIX-ID.
        #[clap(long)]
        out: Option<String>,

        /// Replace an existing output file.
        #[clap(long)]
        overwrite: bool,

        /// Print the share in the clean, printable layout.
        #[clap(long, short)]
        clean: bool,
    },
    /// Print the effective settings as TOML.
    Config {
        /// Write the default settings to the config path if no file exists there.
        #[clap(long)]
        init: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "shamir")]
#[command(version = crate_version!())]
#[command(
    about = "Split secrets into shares and combine them using Shamir's Secret Sharing",
    long_about = "Splits a secret into N shares such that any T of them rebuild it, while fewer than T reveal nothing. Shares are hex tokens that can be printed, written to owner-only files, or laid out in blocks for writing down. Combining fewer than T shares yields garbage without any error, so keep track of the threshold."
)]
struct Opt {
    /// Path of the TOML settings file.
    #[clap(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Subcommand to run.
    #[clap(subcommand)]
    argument: CliArgument,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let opt = Opt::parse();

    if let Err(err) = run(opt) {
        eprintln!("Error: {err:#}");
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(opt: Opt) -> anyhow::Result<()> {
    let config = ShamirConfig::new(&opt.config)
        .with_context(|| format!("could not load settings from {}", opt.config.display()))?;
    debug!("Using config: {:?}", config);

    match opt.argument {
        CliArgument::Split {
            threshold,
            shares,
            file,
            out,
            out_clean,
            overwrite,
            print,
            clean,
        } => {
            let split_config = SplitConfig::new(
                threshold.unwrap_or(config.threshold),
                shares.unwrap_or(config.shares),
            )?;
            let (threshold, shares) = (split_config.threshold(), split_config.shares());

            if out.is_some() && out == out_clean {
                bail!("--out and --out-clean need different filename prefixes");
            }
            for prefix in out.iter().chain(out_clean.iter()) {
                for i in 1..=shares {
                    ensure_writable(Path::new(&share_file_name(prefix, i)), overwrite)?;
                }
            }

            let secret = read_secret(file.as_deref())?;
            let split_shares = split_secret(&secret, threshold, shares, &mut OsRng)
                .context("Error splitting secret")?;

            let combined = Zeroizing::new(combine_shares(&split_shares[..threshold])?);
            ensure!(
                *combined == *secret,
                "Internal error. Could not verify validity of shares data"
            );

            let total = split_shares.len();
            if print || clean || (out.is_none() && out_clean.is_none()) {
                for share in &split_shares {
                    println!("----- Share {} of {}:", share.id, total);
                    println!("{}", render(&share.encode(), clean, &config));
                    println!();
                }
            }

            if let Some(prefix) = &out {
                for share in &split_shares {
                    let path = share_file_name(prefix, share.id as usize);
                    write_private(Path::new(&path), share.encode().as_bytes(), overwrite)
                        .with_context(|| format!("Filesystem error writing {path}"))?;
                    println!("Saved share {} of {} to file: {}", share.id, total, path);
                }
            }

            if let Some(prefix) = &out_clean {
                for share in &split_shares {
                    let path = share_file_name(prefix, share.id as usize);
                    let rendered = render(&share.encode(), true, &config);
                    write_private(Path::new(&path), rendered.as_bytes(), overwrite)
                        .with_context(|| format!("Filesystem error writing {path}"))?;
                    println!(
                        "Saved clean-formatted share {} of {} to file: {}",
                        share.id, total, path
                    );
                }
            }
        }

        CliArgument::Combine {
            prefix,
            dir,
            out,
            out_dir,
            overwrite,
            print,
        } => {
            let out = match out {
                Some(Some(name)) => Some(name),
                Some(None) => match &prefix {
                    Some(prefix) => Some(prefix.clone()),
                    None => bail!("--out requires a filename if no prefix was given"),
                },
                None => None,
            };
            let out = out.map(|name| match &out_dir {
                Some(out_dir) => out_dir.join(name),
                None => PathBuf::from(name),
            });
            if let Some(path) = &out {
                ensure_writable(path, overwrite)?;
            }

            let tokens = read_shares(prefix.as_deref(), &dir)?;
            let secret = Zeroizing::new(combine(&tokens).context("Error combining shares")?);

            if print || out.is_none() {
                let mut stdout = io::stdout().lock();
                stdout.write_all(&secret)?;
                writeln!(stdout)?;
            }

            if let Some(path) = &out {
                write_private(path, &secret, overwrite)
                    .with_context(|| format!("Filesystem error writing {}", path.display()))?;
                println!("Saved secret to file: {}", path.display());
            }
        }

        CliArgument::NewShare {
            id,
            prefix,
            dir,
            out,
            overwrite,
            clean,
        } => {
            let out = out.map(|prefix| PathBuf::from(share_file_name(&prefix, id)));
            if let Some(path) = &out {
                ensure_writable(path, overwrite)?;
            }

            let tokens = read_shares(prefix.as_deref(), &dir)?;
            let token = new_share_token(id, &tokens).context("Error deriving share")?;

            match &out {
                Some(path) => {
                    write_private(path, token.as_bytes(), overwrite)
                        .with_context(|| format!("Filesystem error writing {}", path.display()))?;
                    println!("Saved share {} to file: {}", id, path.display());
                }
                None => {
                    println!("----- Share {}:", id);
                    println!("{}", render(&token, clean, &config));
                }
            }
        }

        CliArgument::Config { init } => {
            if init {
                match ShamirConfig::write_default(&opt.config)? {
                    Some(path) => println!("Wrote default settings to {}", path.display()),
                    None => println!("Settings file {} already exists", opt.config.display()),
                }
            }
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Reads the secret from `file`, or from standard input lines joined with `\n`.
fn read_secret(file: Option<&Path>) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let secret = match file {
        Some(path) => {
            ensure!(path.is_file(), "{} is not a file", path.display());
            fs::read(path).with_context(|| format!("Filesystem error reading {}", path.display()))?
        }
        None => {
            println!("Enter secret to encode. Enter empty line to finish.");
            let lines = Zeroizing::new(read_lines(io::stdin().lock(), io::stdout())?);
            lines.join("\n").into_bytes()
        }
    };
    Ok(Zeroizing::new(secret))
}

/// Reads share tokens from the files `<prefix>-N` in `dir`, or from standard input.
fn read_shares(prefix: Option<&str>, dir: &Path) -> anyhow::Result<Vec<String>> {
    let Some(prefix) = prefix else {
        println!("Enter shares to combine. One share per line. Enter empty line to finish.");
        return Ok(read_lines(io::stdin().lock(), io::stdout())?);
    };

    let files = find_share_files(dir, prefix)
        .with_context(|| format!("Filesystem error searching {}", dir.display()))?;
    match files.len() {
        0 => bail!("No share files {prefix}-X found"),
        1 => bail!(
            "Only one share file {} found. At least two shares are required for combine.",
            files[0].display()
        ),
        _ => {}
    }

    files
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Filesystem error reading {}", path.display()))
        })
        .collect()
}

fn render(token: &str, clean: bool, config: &ShamirConfig) -> String {
    if clean {
        render_clean(token, &config.clean)
    } else {
        token.to_string()
    }
}
