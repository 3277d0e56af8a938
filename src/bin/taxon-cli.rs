use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "taxon-cli")]
#[command(about = "Command-line client for the Taxon Home web services", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Acting user, sent in the user header
    #[arg(long)]
    user: Option<String>,

    #[arg(long, default_value = "X-Username")]
    user_header: String,

    /// Admin API key
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    /// Comma-separated field limit applied to the response payload
    #[arg(long)]
    fields: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with gene links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },
    /// Search pictures by keyword
    Search {
        query: String,
        #[arg(long)]
        image_desc: bool,
        #[arg(long)]
        image_notes: bool,
        #[arg(long)]
        gene_name: bool,
        #[arg(long)]
        gene_symbol: bool,
        #[arg(long)]
        gene_id: bool,
    },
    /// Show the acting user's search history
    History,
    /// Check service status (admin)
    Status,
    /// Show catalogue statistics (admin)
    Stats,
}

#[derive(Subcommand)]
enum LinkAction {
    /// Fetch one link by id, or all links of a tag
    Get {
        #[arg(long, conflicts_with = "tag_id")]
        id: Option<u64>,
        #[arg(long)]
        tag_id: Option<String>,
    },
    /// Create a link between a tag and a feature
    Create {
        #[arg(long)]
        tag_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        organism_id: String,
        #[arg(long)]
        allele: Option<String>,
    },
    /// Delete a link by id
    Delete {
        #[arg(long)]
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(user) = &cli.user {
        headers.insert(
            HeaderName::from_bytes(cli.user_header.as_bytes())?,
            HeaderValue::from_str(user)?,
        );
    }
    let api = format!("{}/api", cli.url);

    let mut query: Vec<(String, String)> = Vec::new();
    if let Some(fields) = &cli.fields {
        query.push(("fields".into(), fields.clone()));
    }

    let res = match cli.command {
        Commands::Link { action } => match action {
            LinkAction::Get { id, tag_id } => {
                if let Some(id) = id {
                    query.push(("geneLinkId".into(), id.to_string()));
                }
                if let Some(tag_id) = tag_id {
                    query.push(("tagId".into(), tag_id));
                }
                client
                    .get(format!("{}/geneLinks", api))
                    .headers(headers)
                    .query(&query)
                    .send()
                    .await?
            }
            LinkAction::Create {
                tag_id,
                name,
                organism_id,
                allele,
            } => {
                let mut body = Map::new();
                body.insert("tagId".into(), json!(tag_id));
                body.insert("name".into(), json!(name));
                body.insert("organismId".into(), json!(organism_id));
                if let Some(allele) = allele {
                    body.insert("allele".into(), json!(allele));
                }
                client
                    .post(format!("{}/geneLinks", api))
                    .headers(headers)
                    .query(&query)
                    .json(&Value::Object(body))
                    .send()
                    .await?
            }
            LinkAction::Delete { id } => {
                query.push(("geneLinkId".into(), id.to_string()));
                client
                    .delete(format!("{}/geneLinks", api))
                    .headers(headers)
                    .query(&query)
                    .send()
                    .await?
            }
        },
        Commands::Search {
            query: keywords,
            image_desc,
            image_notes,
            gene_name,
            gene_symbol,
            gene_id,
        } => {
            query.push(("query".into(), keywords));
            for (flag, set) in [
                ("searchImageDesc", image_desc),
                ("searchImageNotes", image_notes),
                ("searchGeneName", gene_name),
                ("searchGeneSymbol", gene_symbol),
                ("searchGeneID", gene_id),
            ] {
                if set {
                    query.push((flag.into(), "true".into()));
                }
            }
            client
                .get(format!("{}/search", api))
                .headers(headers)
                .query(&query)
                .send()
                .await?
        }
        Commands::History => {
            client
                .get(format!("{}/searchHistory", api))
                .headers(headers)
                .query(&query)
                .send()
                .await?
        }
        Commands::Status => {
            admin_get(&client, &cli.url, "status", &cli.key).await?
        }
        Commands::Stats => {
            admin_get(&client, &cli.url, "stats", &cli.key).await?
        }
    };

    print_response(res).await
}

async fn admin_get(
    client: &reqwest::Client,
    url: &str,
    path: &str,
    key: &str,
) -> Result<reqwest::Response, Box<dyn std::error::Error>> {
    let res = client
        .get(format!("{}/admin/{}", url, path))
        .header(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?)
        .send()
        .await?;
    Ok(res)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
