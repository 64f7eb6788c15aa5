use annotation_guide::render::{render_annotations_json, render_csv};
use annotation_guide::{DirectoryResolver, Guide, GuideConfig, GuideFactory, GuideOptions};
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "annotation-guide")]
#[command(about = "Validate annotation records against an annotation schema", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "annotation_guide=debug").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the record fields the guide expects, in order.
    Fields {
        #[command(flatten)]
        guide: GuideArgs,
    },
    /// Add records from a JSON array or JSON-lines file and write the accepted annotations.
    Add {
        #[command(flatten)]
        guide: GuideArgs,

        #[arg(long)]
        records: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        /// Skip records that fail validation instead of stopping at the first one.
        #[arg(long)]
        keep_going: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Schema-shaped annotations.
    Json,
    /// Flat annotation table.
    Csv,
}

#[derive(Args)]
struct GuideArgs {
    /// Directory with tables.json and schemas/<name>.json.
    #[arg(long, conflicts_with = "schema_file")]
    dir: Option<PathBuf>,

    #[arg(long, requires = "dir")]
    table: Option<String>,

    #[arg(long, requires = "dir")]
    schema: Option<String>,

    /// Read the schema directly from a JSON file.
    #[arg(long)]
    schema_file: Option<PathBuf>,

    /// Records update existing annotations and need an integer id.
    #[arg(long)]
    update: bool,

    #[arg(long)]
    id_field: bool,

    /// JSON guide config, e.g. {"spatial_point_classes": [...]}.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spatial-point class name; repeat to replace the configured list.
    #[arg(long = "spatial-class")]
    spatial_classes: Vec<String>,
}

impl GuideArgs {
    fn guide_config(&self) -> Result<GuideConfig> {
        let mut config = match &self.config {
            Some(path) => GuideConfig::from_file(path)?,
            None => GuideConfig::default(),
        };
        if !self.spatial_classes.is_empty() {
            config.spatial_point_classes = self.spatial_classes.clone();
        }
        Ok(config)
    }

    fn build(&self) -> Result<Guide> {
        let config = self.guide_config()?;

        if let Some(path) = &self.schema_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read schema file {}", path.display()))?;
            let schema: Value = serde_json::from_str(&text)
                .with_context(|| format!("parse schema file {}", path.display()))?;
            let options = GuideOptions {
                name: None,
                update: self.update,
                id_field: self.id_field,
                config,
            };
            return Ok(Guide::with_options(schema, options)?);
        }

        let Some(dir) = &self.dir else {
            bail!("either --dir or --schema-file is required");
        };
        let resolver = DirectoryResolver::new(dir);
        let mut factory = GuideFactory::new(&resolver)
            .update(self.update)
            .id_field(self.id_field)
            .config(config);
        if let Some(table) = &self.table {
            factory = factory.table_name(table);
        }
        if let Some(schema) = &self.schema {
            factory = factory.schema_name(schema);
        }
        Ok(factory.build()?)
    }
}

/// Records file: a JSON array of objects, or one JSON object per line.
fn read_records(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read records file {}", path.display()))?;

    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text)
            .with_context(|| format!("parse records file {}", path.display()));
    }

    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(line)
            .with_context(|| format!("parse record at {}:{}", path.display(), lineno + 1))?;
        out.push(record);
    }
    Ok(out)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Commands::Fields { guide } => {
            let guide = guide.build()?;
            for field in guide.field_specs() {
                let req = if field.required { "required" } else { "optional" };
                println!("{}\t{}", field.name, req);
            }
        }
        Commands::Add {
            guide,
            records,
            format,
            out,
            keep_going,
        } => {
            let mut guide = guide.build()?;

            let mut rejected = 0usize;
            for (i, record) in read_records(&records)?.into_iter().enumerate() {
                match guide.add(record) {
                    Ok(_) => {}
                    Err(e) if keep_going => {
                        warn!(record = i + 1, error = %e, "skipping invalid record");
                        rejected += 1;
                    }
                    Err(e) => {
                        return Err(anyhow::Error::new(e)
                            .context(format!("record {} in {}", i + 1, records.display())));
                    }
                }
            }
            info!(rejected, "{}", guide);

            let text = match format {
                Format::Json => render_annotations_json(&guide.annotations())?,
                Format::Csv => render_csv(&guide.annotation_dataframe()),
            };
            match out {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("write output {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", text),
            }
        }
    }

    Ok(())
}
