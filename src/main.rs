use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use billpdf::bill::format::format_currency;
use billpdf::bill::{load_bill, BillFile, StoreSettings, SAMPLE_BILL};
use billpdf::config::{
    config_dir, load_config, load_template, resolve_output_dir, template_path, Config,
    BILL_TEMPLATE, CONFIG_TEMPLATE,
};
use billpdf::error::{BillError, Result};
use billpdf::layout::A4_HEIGHT;
use billpdf::render::{BillRenderer, RenderSettings};
use billpdf::template::Template;

#[derive(Parser)]
#[command(name = "billpdf")]
#[command(version, about = "Render retail bills to paginated PDFs", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir for billpdf)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files and a sample bill
    Init,

    /// Render a bill JSON file to PDF
    Render {
        /// Bill JSON file ({ "bill": ..., "items": [...], "settings"?: ... })
        bill: PathBuf,

        /// HTML template to use instead of templates/bill.html
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Custom output file path (default: output_dir/<billNumber>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Print the populated template markup
    Preview {
        bill: PathBuf,

        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// Show line items and how the bill splits into pages
    Inspect {
        bill: PathBuf,

        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// Print the built-in bill template
    Template,

    /// Show config directory, store and output settings
    Status,
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("billpdf=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Render {
            bill,
            template,
            output,
            open,
        } => cmd_render(&cfg_dir, &bill, template.as_deref(), output, open),
        Commands::Preview { bill, template } => cmd_preview(&cfg_dir, &bill, template.as_deref()),
        Commands::Inspect { bill, template } => cmd_inspect(&cfg_dir, &bill, template.as_deref()),
        Commands::Template => {
            print!("{}", BILL_TEMPLATE);
            Ok(())
        }
        Commands::Status => cmd_status(&cfg_dir),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(BillError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::create_dir_all(cfg_dir.join("templates"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(template_path(cfg_dir), BILL_TEMPLATE)?;
    fs::write(cfg_dir.join("sample-bill.json"), SAMPLE_BILL)?;

    println!("Initialized billpdf config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your store details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Adjust the bill layout:   $EDITOR {}",
        template_path(cfg_dir).display()
    );
    println!();
    println!("Then render the sample bill:");
    println!("  billpdf render {}/sample-bill.json", cfg_dir.display());

    Ok(())
}

/// Everything a command needs to render one bill
struct Job {
    config: Config,
    file: BillFile,
    store: StoreSettings,
    template: Template,
}

fn load_job(cfg_dir: &Path, bill_path: &Path, template: Option<&Path>) -> Result<Job> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let config = load_config(cfg_dir)?;
    let file = load_bill(bill_path)?;
    let template = Template::parse(&load_template(cfg_dir, template)?);
    let store = file
        .settings
        .clone()
        .unwrap_or_else(|| config.store.clone());

    Ok(Job {
        config,
        file,
        store,
        template,
    })
}

impl Job {
    fn renderer(&self) -> BillRenderer {
        BillRenderer::new(RenderSettings::from(&self.config))
    }
}

fn cmd_render(
    cfg_dir: &Path,
    bill_path: &Path,
    template: Option<&Path>,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let job = load_job(cfg_dir, bill_path, template)?;
    let renderer = job.renderer();
    let bill = &job.file.bill;

    let (path, rendered) = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let rendered =
                renderer.render_to_path(&job.template, bill, &job.file.items, &job.store, &path)?;
            (path, rendered)
        }
        None => {
            let dir = resolve_output_dir(&job.config.pdf.output_dir, cfg_dir);
            renderer.render_to_dir(&job.template, bill, &job.file.items, &job.store, &dir)?
        }
    };

    println!("Rendered bill: {}", bill.bill_number);
    println!(
        "Total: {}",
        format_currency(bill.total, &job.config.format)
    );
    println!("Pages: {}", rendered.page_count());
    println!("PDF saved to: {}", path.display());

    if open {
        open_path(&path)?;
    }

    Ok(())
}

fn cmd_preview(cfg_dir: &Path, bill_path: &Path, template: Option<&Path>) -> Result<()> {
    let job = load_job(cfg_dir, bill_path, template)?;
    let markup = job
        .renderer()
        .markup(&job.template, &job.file.bill, &job.file.items, &job.store);
    println!("{}", markup);
    Ok(())
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "PRODUCT")]
    product: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "QTY")]
    quantity: u32,
    #[tabled(rename = "PRICE")]
    unit_price: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

#[derive(Tabled)]
struct PageRow {
    #[tabled(rename = "PAGE")]
    page: usize,
    #[tabled(rename = "FROM (pt)")]
    from: String,
    #[tabled(rename = "TO (pt)")]
    to: String,
}

fn cmd_inspect(cfg_dir: &Path, bill_path: &Path, template: Option<&Path>) -> Result<()> {
    let job = load_job(cfg_dir, bill_path, template)?;
    let bill = &job.file.bill;
    let format = &job.config.format;

    println!("Bill {} ({})", bill.bill_number, bill.payment_mode);
    println!();

    if job.file.items.is_empty() {
        println!("No line items.");
    } else {
        let rows: Vec<ItemRow> = job
            .file
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| ItemRow {
                index: i + 1,
                product: item.product_name.clone(),
                size: item.size.clone().unwrap_or_default(),
                quantity: item.quantity,
                unit_price: format_currency(item.unit_price, format),
                total: format_currency(item.total_price, format),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    let rendered =
        job.renderer()
            .render_bytes(&job.template, bill, &job.file.items, &job.store)?;

    println!();
    println!("Strip height: {:.1}pt", rendered.strip_height);
    println!("Pages:        {}", rendered.page_count());

    let rows: Vec<PageRow> = rendered
        .pages
        .iter()
        .map(|slice| PageRow {
            page: slice.index + 1,
            from: format!("{:.1}", slice.offset),
            to: format!("{:.1}", (slice.offset + A4_HEIGHT).min(rendered.strip_height)),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    Ok(())
}

fn cmd_status(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let config = load_config(cfg_dir)?;
    let template = template_path(cfg_dir);
    let template_label = if template.exists() {
        template.display().to_string()
    } else {
        "built-in".to_string()
    };

    println!("Bill Renderer Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Store:            {}", config.store.store_name);
    println!(
        "Output directory: {}",
        resolve_output_dir(&config.pdf.output_dir, cfg_dir).display()
    );
    println!("Template:         {}", template_label);
    println!(
        "Currency:         {} ({:?} grouping)",
        config.format.currency_symbol, config.format.grouping
    );

    Ok(())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(pdf_path)
            .spawn()?;
    }
    Ok(())
}
