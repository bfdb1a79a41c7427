//! Highlights the comments of a saved wiki page.
//!
//! ```text
//! annotate <page.html> <comments.json> [--config <config.json>] [--page <page id>] [--json]
//! ```
//!
//! Prints the highlighted content element, then a summary of the comments whose anchors no
//! longer resolve. Logs go to stderr.

mod provider;

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, bail};
use provider::JsonCommentProvider;
use smartcomment::{Annotator, AnnotatorConfig, AnnotatorProviders, ClickCallback, ReloadOutcome};
use smartcomment_html::HtmlDocument;
use smartcomment_traits::{DomEvent, DomRect};
use smartcomment_traits::comments::CommentRecord;

const USAGE: &str =
    "usage: annotate <page.html> <comments.json> [--config <config.json>] [--page <page id>] [--json]";

struct Args {
    page: PathBuf,
    comments: PathBuf,
    config: Option<PathBuf>,
    page_id: String,
    json: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut positional = Vec::new();
        let mut config = None;
        let mut page_id = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(args.next().context(USAGE)?.into()),
                "--page" => page_id = Some(args.next().context(USAGE)?),
                "--json" => json = true,
                "-h" | "--help" => bail!(USAGE),
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                _ => positional.push(PathBuf::from(&arg)),
            }
        }

        let [page, comments]: [PathBuf; 2] = positional
            .try_into()
            .map_err(|_| anyhow::anyhow!(USAGE))?;
        let page_id = page_id.unwrap_or_else(|| {
            page.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(Self {
            page,
            comments,
            config,
            page_id,
            json,
        })
    }
}

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse(std::env::args().skip(1))?;

    let html = fs::read_to_string(&args.page)
        .with_context(|| format!("could not read {}", args.page.display()))?;
    let comments = fs::read_to_string(&args.comments)
        .with_context(|| format!("could not read {}", args.comments.display()))?;
    let config: AnnotatorConfig = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => AnnotatorConfig::default(),
    };

    let provider = JsonCommentProvider::from_json(&comments)
        .with_context(|| format!("invalid comments {}", args.comments.display()))?;
    let annotator = Annotator::new(config, AnnotatorProviders::new(provider));

    let mut doc = HtmlDocument::from_html(&html).into_inner();
    annotator.prepare_content(&mut doc);

    let on_click: ClickCallback = Rc::new(|_: &DomEvent, _: &CommentRecord, _: DomRect| {});
    let outcome = pollster::block_on(annotator.reload_highlights(&mut doc, &args.page_id, &on_click))?;
    let ReloadOutcome::Reloaded { applied, broken } = outcome else {
        bail!("a highlight reload is already running");
    };

    let scope = annotator.content_scope(&doc);
    let content = doc
        .get_node(scope)
        .map(|node| node.outer_html())
        .unwrap_or_default();

    if args.json {
        let report = serde_json::json!({
            "page": args.page_id,
            "applied": applied,
            "broken": broken,
            "html": content,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{content}");
    eprintln!("{applied} comment(s) highlighted, {} broken", broken.len());
    for comment in &broken {
        eprintln!(
            "  #{} {}",
            comment.id,
            comment.pos.as_deref().unwrap_or("(no position)")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        Args::parse(list.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn page_id_defaults_to_the_file_name() {
        let parsed = args(&["pages/Main_Page.html", "comments.json", "--json"]).unwrap();
        assert_eq!(parsed.page_id, "Main_Page");
        assert!(parsed.json);
        assert!(parsed.config.is_none());

        let parsed = args(&["a.html", "--page", "Other", "b.json", "--config", "c.json"]).unwrap();
        assert_eq!(parsed.page_id, "Other");
        assert_eq!(parsed.comments, PathBuf::from("b.json"));
        assert_eq!(parsed.config, Some(PathBuf::from("c.json")));
    }

    #[test]
    fn bad_arguments() {
        assert!(args(&["only.html"]).is_err());
        assert!(args(&["a.html", "b.json", "--bogus"]).is_err());
        assert!(args(&["a.html", "b.json", "--page"]).is_err());
    }
}
