//! pagedown CLI - PDF page reconstruction to Markdown

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagedown::convert::{extract_metadata, unlock};
use pagedown::{
    ConvertOptions, Converter, ImageMode, ImageOptions, JsonFrontMatter, PageSelection, PdfFile,
    RenderOptions, YamlFrontMatter,
};

#[derive(Parser)]
#[command(name = "pagedown")]
#[command(version)]
#[command(about = "Reconstruct PDF pages into reading-ordered Markdown", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Password for encrypted documents
    #[arg(long, env = "PAGEDOWN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PDF to Markdown
    #[command(alias = "md")]
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Password for encrypted documents
        #[arg(long, env = "PAGEDOWN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Write images to this directory instead of embedding them
        #[arg(long, value_name = "DIR", conflicts_with = "no_images")]
        image_dir: Option<PathBuf>,

        /// Leave images out of the output
        #[arg(long)]
        no_images: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Front matter format
        #[arg(long, value_enum, default_value = "yaml")]
        frontmatter: FrontMatterFormat,

        /// Insert a table of contents built from the outline
        #[arg(long)]
        toc: bool,

        /// Skip the embedded files and security sections
        #[arg(long)]
        no_sections: bool,

        /// Also write document metadata as JSON to this file
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Password for encrypted documents
        #[arg(long, env = "PAGEDOWN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FrontMatterFormat {
    /// YAML key/value block
    Yaml,
    /// Pretty-printed JSON inside fences
    Json,
    /// No front matter
    None,
}

struct ConvertArgs<'a> {
    input: &'a Path,
    output: Option<&'a Path>,
    password: Option<String>,
    image_dir: Option<PathBuf>,
    no_images: bool,
    pages: Option<&'a str>,
    frontmatter: FrontMatterFormat,
    toc: bool,
    no_sections: bool,
    metadata: Option<&'a Path>,
}

impl<'a> ConvertArgs<'a> {
    fn stdout(input: &'a Path, password: Option<String>) -> Self {
        Self {
            input,
            output: None,
            password,
            image_dir: None,
            no_images: false,
            pages: None,
            frontmatter: FrontMatterFormat::Yaml,
            toc: false,
            no_sections: false,
            metadata: None,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            password,
            image_dir,
            no_images,
            pages,
            frontmatter,
            toc,
            no_sections,
            metadata,
        }) => cmd_convert(ConvertArgs {
            input: &input,
            output: output.as_deref(),
            password,
            image_dir,
            no_images,
            pages: pages.as_deref(),
            frontmatter,
            toc,
            no_sections,
            metadata: metadata.as_deref(),
        }),
        Some(Commands::Info { input, password }) => cmd_info(&input, password.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                cmd_convert(ConvertArgs::stdout(&input, cli.password))
            } else {
                println!("{}", "Usage: pagedown <FILE>".yellow());
                println!("       pagedown --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// 2 for password failures so scripts can prompt and retry.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<pagedown::Error>() {
        Some(e) if e.is_access_denied() => 2,
        _ => 1,
    }
}

fn build_options(args: &ConvertArgs<'_>) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let pages = match args.pages {
        Some(p) => PageSelection::parse(p)?,
        None => PageSelection::All,
    };

    let mut render = RenderOptions::new();
    if args.no_images {
        render = render.without_images();
    } else if let Some(dir) = &args.image_dir {
        render = render.with_images(ImageOptions {
            mode: ImageMode::Files {
                dir: dir.clone(),
                link_prefix: image_link_prefix(dir, args.output),
            },
            ..ImageOptions::default()
        });
    }

    let mut options = ConvertOptions::new()
        .with_render_options(render)
        .with_pages(pages)
        .with_toc(args.toc)
        .with_document_sections(!args.no_sections);
    options = match args.frontmatter {
        FrontMatterFormat::Yaml => options.with_front_matter(Arc::new(YamlFrontMatter)),
        FrontMatterFormat::Json => options.with_front_matter(Arc::new(JsonFrontMatter)),
        FrontMatterFormat::None => options.without_front_matter(),
    };
    if let Some(password) = &args.password {
        options = options.with_password(password.clone());
    }
    Ok(options)
}

/// Image links relative to the Markdown file's directory.
fn image_link_prefix(dir: &Path, output: Option<&Path>) -> String {
    let base = output.and_then(Path::parent).unwrap_or_else(|| Path::new(""));
    let relative = dir.strip_prefix(base).unwrap_or(dir);
    let relative = relative.to_string_lossy().replace('\\', "/");
    let relative = relative.trim_end_matches('/');
    if relative.is_empty() {
        String::new()
    } else {
        format!("{}/", relative)
    }
}

fn cmd_convert(args: ConvertArgs<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&args)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Converting {}...", args.input.display()));

    let conversion = Converter::new(options).convert_file(args.input);
    pb.finish_and_clear();
    let conversion = conversion?;
    log::debug!("{:?}", conversion.stats);

    if let Some(path) = args.metadata {
        fs::write(path, serde_json::to_string_pretty(&conversion.metadata)?)?;
    }

    if let Some(path) = args.output {
        fs::write(path, &conversion.markdown)?;
        eprintln!(
            "{} {} ({} pages, {} tables, {} images)",
            "Saved to".green(),
            path.display(),
            conversion.stats.pages,
            conversion.stats.tables,
            conversion.stats.images
        );
        if conversion.stats.skipped > 0 {
            eprintln!(
                "{} {} elements could not be read",
                "Warning:".yellow().bold(),
                conversion.stats.skipped
            );
        }
    } else {
        println!("{}", conversion.markdown);
    }

    Ok(())
}

fn cmd_info(input: &Path, password: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = PdfFile::open(input)?;
    unlock(&mut doc, password)?;
    let metadata = extract_metadata(&doc);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Title".bold(), metadata.title);
    println!("{}: {}", "Author".bold(), metadata.author);
    println!("{}: {}", "Pages".bold(), metadata.pages);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref subject) = metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref created) = metadata.creation_date {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified_date {
        println!("{}: {}", "Modified".bold(), modified);
    }

    let files = pagedown::PdfDocument::embedded_files(&doc);
    println!();
    println!("{}", "Structure".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Bookmarks".bold(), metadata.bookmarks.len());
    println!("{}: {}", "Embedded files".bold(), files.len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagedown".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF page reconstruction to Markdown");
    println!();
    println!("License: MIT");
}
