use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use reqwest::Client;

#[derive(Parser)]
#[command(name = "vcr-search-cli")]
#[command(about = "Query a running vcr-search server", long_about = None)]
struct Cli {
    #[arg(short, long, env = "VCR_SEARCH_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest names, addresses and topics
    Autocomplete {
        /// Partial term
        #[arg(value_name = "TERM")]
        q: String,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Topic-oriented credential search
    Credentials {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Credential facet counts
    Facets {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Topic search
    Topics {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Check server health
    Health,
}

#[derive(Args)]
struct SearchArgs {
    /// Query parameter as key=value, repeatable
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    #[arg(long)]
    page: Option<u32>,

    #[arg(short = 's', long)]
    page_size: Option<u32>,
}

impl SearchArgs {
    fn query_pairs(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut pairs = self
            .params
            .iter()
            .map(|raw| {
                raw.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| anyhow!("parameter '{}' is not key=value", raw))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        Ok(pairs)
    }
}

async fn get(client: &Client, url: String, pairs: &[(String, String)]) -> anyhow::Result<()> {
    let response = client
        .get(&url)
        .query(pairs)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        return Err(anyhow!("server responded with {}", status));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let endpoint = cli.endpoint.trim_end_matches('/');

    match cli.command {
        Commands::Autocomplete { q, search } => {
            let mut pairs = search.query_pairs()?;
            pairs.push(("q".to_string(), q));
            get(&client, format!("{}/search/autocomplete", endpoint), &pairs).await?;
        }

        Commands::Credentials { search } => {
            let pairs = search.query_pairs()?;
            get(&client, format!("{}/search/credentials", endpoint), &pairs).await?;
        }

        Commands::Facets { search } => {
            let pairs = search.query_pairs()?;
            get(&client, format!("{}/search/credentials/facets", endpoint), &pairs).await?;
        }

        Commands::Topics { search } => {
            let pairs = search.query_pairs()?;
            get(&client, format!("{}/search/topics", endpoint), &pairs).await?;
        }

        Commands::Health => {
            get(&client, format!("{}/health", endpoint), &[]).await?;
        }
    }

    Ok(())
}
