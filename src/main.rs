use log::{debug, LevelFilter};
use structopt::StructOpt;

use attercop::cli;
use attercop::config::{IndexConfig, SearchConfig};
use attercop::error::Error;
use attercop::index;
use attercop::lang::Lang;
use attercop::search::Searcher;

fn main() -> Result<(), Error> {
    // set default log level to info
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    builder.init();

    let opt = cli::Attercop::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Attercop::Index(i) => {
            let mut cfg = IndexConfig {
                language: i.language.parse()?,
                min_token_len: i.min_token_len,
                min_df: i.min_df,
                max_df_ratio: i.max_df_ratio,
                block_docs: i.block_docs,
                max_in_flight: i.max_in_flight,
                max_tasks_per_worker: i.max_tasks_per_worker,
                keep_blocks: i.keep_blocks,
                ..Default::default()
            };
            if let Some(workers) = i.workers {
                cfg.workers = workers;
            }
            let summary = index::build(&i.corpus, &i.dst, &cfg)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        cli::Attercop::Search(s) => {
            let cfg = SearchConfig {
                query_language: s.query_language.parse()?,
                min_token_len: s.min_token_len,
                top_k: s.top_k,
            };
            let language = s
                .language
                .as_deref()
                .map(str::parse::<Lang>)
                .transpose()?;
            let searcher = Searcher::open(&s.index, cfg)?;
            let response = searcher.search(&s.query, language)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    };
    Ok(())
}
