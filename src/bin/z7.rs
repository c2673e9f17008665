use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use structopt::StructOpt;

use z7::{deflate_compress, deflate_decompress, gzip_compress, gzip_decompress, CompressionMode, GzipOptions};

#[derive(StructOpt)]
#[structopt(about = "A DEFLATE (RFC 1951) and gzip (RFC 1952) codec")]
enum Z7Command {
    Deflate {
        #[structopt(subcommand)]
        action: Action,
    },
    Gzip {
        #[structopt(subcommand)]
        action: Action,
        #[structopt(long)]
        name: Option<String>,
        #[structopt(long)]
        comment: Option<String>,
        #[structopt(long)]
        text: bool,
        #[structopt(long)]
        header_crc: bool,
    },
}

#[derive(StructOpt)]
enum Action {
    Compress {
        input: PathBuf,
        output: Option<PathBuf>,
        #[structopt(long, default_value = "size", possible_values = &["none", "speed", "size"])]
        mode: String,
    },
    Decompress {
        input: PathBuf,
        output: Option<PathBuf>,
    },
}

fn parse_mode(mode: &str) -> CompressionMode {
    match mode {
        "none" => CompressionMode::NoCompression,
        "speed" => CompressionMode::BestSpeed,
        _ => CompressionMode::BestSize,
    }
}

fn open_input(path: &PathBuf) -> io::Result<Box<dyn Read>> {
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

fn open_output(path: Option<&PathBuf>, default: PathBuf) -> io::Result<Box<dyn Write>> {
    let path = path.cloned().unwrap_or(default);
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

fn run() -> z7::Z7Result<()> {
    let command = Z7Command::from_args();

    match command {
        Z7Command::Deflate { action } => match action {
            Action::Compress { input, output, mode } => {
                let mut source = open_input(&input)?;
                let mut sink = open_output(output.as_ref(), input.with_extension("z"))?;
                deflate_compress(&mut source, &mut sink, parse_mode(&mode))?;
            }
            Action::Decompress { input, output } => {
                let mut source = open_input(&input)?;
                let mut sink = open_output(output.as_ref(), input.with_extension(""))?;
                deflate_decompress(&mut source, &mut sink)?;
            }
        },
        Z7Command::Gzip {
            action,
            name,
            comment,
            text,
            header_crc,
        } => match action {
            Action::Compress { input, output, mode } => {
                let mut source = open_input(&input)?;
                let mut sink = open_output(output.as_ref(), input.with_extension("gz"))?;
                let options = GzipOptions {
                    text,
                    header_crc,
                    extra: None,
                    name: name.or_else(|| {
                        input
                            .file_name()
                            .map(|s| s.to_string_lossy().into_owned())
                    }),
                    comment,
                    mtime: 0,
                };
                gzip_compress(&mut source, &mut sink, parse_mode(&mode), &options)?;
            }
            Action::Decompress { input, output } => {
                let mut source = open_input(&input)?;
                let mut sink = open_output(output.as_ref(), input.with_extension(""))?;
                let info = gzip_decompress(&mut source, &mut sink)?;
                if let Some(name) = info.name {
                    log::debug!("gzip: original name was {:?}", name);
                }
            }
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("z7: {}", err);
            ExitCode::FAILURE
        }
    }
}
