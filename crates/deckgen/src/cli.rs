use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deckgen")]
#[command(author, version, about)]
#[command(long_about = "Generate presentation slides from a research article.\n\n\
    Point deckgen at a markdown rendering of an article and it produces a\n\
    slide deck with speaker notes, one model call per slide.\n\n\
    Examples:\n  \
    deckgen paper.md                     Generate paper.slides.md\n  \
    deckgen paper.md -o deck.md          Generate into deck.md\n  \
    deckgen sections paper.md            Inspect the segmented sections\n  \
    deckgen config set chat.model M     Pick a model")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Markdown article to convert
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output file for the generated deck (default: <input>.slides.md)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Example source excerpt steering the overview slide
    #[arg(long)]
    pub example_source: Option<PathBuf>,

    /// Example slide paired with the source excerpt
    #[arg(long)]
    pub example_slide: Option<PathBuf>,

    /// Character budget for one source window
    #[arg(long)]
    pub min_chars: Option<usize>,

    /// Lookahead distance for absorbing a near section boundary
    #[arg(long)]
    pub lookahead: Option<usize>,

    /// Model identifier to request
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the segmented and classified sections of an article
    Sections {
        /// Markdown article to inspect
        file: PathBuf,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. chat.model, generation.min-chars)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Sections { file }) => {
                if !file.exists() {
                    anyhow::bail!("File not found: {}", file.display());
                }
                crate::commands::sections::run(&file)
            }
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("deckgen {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                if let Some(file) = self.file {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                    crate::commands::generate::run(crate::commands::generate::Args {
                        file,
                        output: self.output,
                        example_source: self.example_source,
                        example_slide: self.example_slide,
                        min_chars: self.min_chars,
                        lookahead: self.lookahead,
                        model: self.model,
                    })
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}
