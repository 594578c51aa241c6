use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use huffman_code::{CodeTable, Encoded, Tree};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::{
    collections::BTreeMap,
    fs::{read_to_string, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

#[derive(Parser)]
pub struct Options {
    #[clap(flatten)]
    global: GlobalOptions,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
pub struct GlobalOptions {
    /// Log more, may be repeated.
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

impl GlobalOptions {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
pub enum Command {
    /// Print the code of every character in a file.
    Codes(CodesOptions),
    /// Encode text with the codes derived from a file.
    Encode(EncodeOptions),
}

pub trait Runnable {
    fn run(&self, global: &GlobalOptions) -> Result<()>;
}

fn tally(text: &str) -> BTreeMap<char, usize> {
    text.chars().fold(BTreeMap::new(), |mut counts, c| {
        *counts.entry(c).or_default() += 1;
        counts
    })
}

fn load(path: &Path) -> Result<(String, BTreeMap<char, usize>, Tree<char>)> {
    let text = read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let counts = tally(&text);
    let tree = Tree::new(counts.clone())
        .with_context(|| format!("building codes for {}", path.display()))?;
    info!(
        "{}: {} characters, {} distinct",
        path.display(),
        tree.weight(),
        tree.alphabet_size()
    );
    Ok((text, counts, tree))
}

#[derive(Parser)]
pub struct CodesOptions {
    file: PathBuf,
}

impl Runnable for CodesOptions {
    fn run(&self, _global: &GlobalOptions) -> Result<()> {
        let (_, counts, tree) = load(&self.file)?;
        let table = CodeTable::new(&tree);

        for (symbol, code) in table.iter() {
            let code = Encoded::from(code.to_bitvec());
            println!("{symbol:?}\t{}\t{code}", counts[symbol]);
        }
        println!("total: {} bits", table.weighted_length(counts)?);
        Ok(())
    }
}

#[derive(Parser)]
pub struct EncodeOptions {
    /// Text to encode, defaults to the contents of the file.
    #[clap(short, long)]
    text: Option<String>,

    /// Write packed bytes here instead of printing bits.
    #[clap(short, long)]
    output: Option<PathBuf>,

    file: PathBuf,
}

impl Runnable for EncodeOptions {
    fn run(&self, _global: &GlobalOptions) -> Result<()> {
        let (text, _, tree) = load(&self.file)?;
        let table = tree.codes();
        let input = self.text.as_deref().unwrap_or(&text);
        let encoded = table.encode(input.chars())?;

        match &self.output {
            Some(path) => {
                let file =
                    File::create(path).with_context(|| format!("creating {}", path.display()))?;
                encoded.write_packed(BufWriter::new(file))?;
                info!(
                    "wrote {} bits as {} bytes to {}",
                    encoded.len(),
                    encoded.packed_len(),
                    path.display()
                );
            }
            None => println!("{encoded}"),
        }
        Ok(())
    }
}

impl Runnable for Command {
    fn run(&self, global: &GlobalOptions) -> Result<()> {
        match self {
            Command::Codes(command) => command.run(global),
            Command::Encode(command) => command.run(global),
        }
    }
}

impl Options {
    fn run(&self) -> Result<()> {
        self.command.run(&self.global)
    }
}

fn main() -> Result<()> {
    let options = Options::parse();
    TermLogger::init(
        options.global.level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    options.run()
}
