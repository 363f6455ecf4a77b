use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use cvpress::{
    FontSource, PageGeometry, ProfileDocument, RenderOptions, SectionKind, UrlFetcher, write_cv,
};

#[derive(Clone, Copy, ValueEnum)]
enum PageSize {
    A4,
    Letter,
}

#[derive(Parser)]
#[command(name = "cvpress")]
#[command(version)]
#[command(about = "Lay out a profile snapshot as a paginated CV PDF", long_about = None)]
struct Cli {
    /// Content snapshot (JSON)
    #[arg(value_name = "SNAPSHOT")]
    input: PathBuf,

    /// Output directory or file (defaults to the current directory)
    #[arg(short, long, value_name = "DIR|FILE")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "a4")]
    page_size: PageSize,

    /// Hide a section: experience, skills, projects, education or certificates
    #[arg(long = "hide", value_name = "SECTION")]
    hide: Vec<SectionKind>,

    /// Number of projects listed
    #[arg(long, value_name = "N")]
    max_projects: Option<usize>,

    /// Print project descriptions under their titles
    #[arg(long)]
    project_descriptions: bool,

    /// Skip the portrait photo
    #[arg(long)]
    no_photo: bool,

    #[arg(long, value_name = "MS", env = "CVPRESS_PHOTO_TIMEOUT_MS")]
    photo_timeout_ms: Option<u64>,

    /// TrueType font for regular text (embedded, subsetted)
    #[arg(long, value_name = "TTF")]
    font_regular: Option<PathBuf>,

    /// TrueType font for bold text
    #[arg(long, value_name = "TTF", requires = "font_regular")]
    font_bold: Option<PathBuf>,
}

impl Cli {
    fn render_options(&self) -> RenderOptions {
        let mut options = RenderOptions {
            geometry: match self.page_size {
                PageSize::A4 => PageGeometry::a4(),
                PageSize::Letter => PageGeometry::letter(),
            },
            include_project_descriptions: self.project_descriptions,
            ..RenderOptions::default()
        };
        for &kind in &self.hide {
            options.visibility.set(kind, false);
        }
        if let Some(n) = self.max_projects {
            options.max_projects = n;
        }
        options.portrait.enabled = !self.no_photo;
        if let Some(ms) = self.photo_timeout_ms {
            options.portrait.timeout = Duration::from_millis(ms);
        }
        if let Some(regular) = &self.font_regular {
            options.fonts = FontSource::TrueType {
                regular: regular.clone(),
                bold: self.font_bold.clone(),
            };
        }
        options
    }
}

fn run(cli: &Cli) -> Result<PathBuf, cvpress::Error> {
    let json = std::fs::read_to_string(&cli.input)?;
    let profile = ProfileDocument::from_snapshot_json(&json)?;
    let options = cli.render_options();
    let fetcher = UrlFetcher::new(options.portrait.timeout);
    let target = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
    write_cv(&profile, &options, &fetcher, &target)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
