//! RSS 2.0 feed
//!
//! Item descriptions carry the summary rendered from markdown to HTML,
//! wrapped in CDATA.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pulldown_cmark::{html, Options, Parser};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::info;

use super::{SummaryCache, SummaryEntry, SummarySink};
use crate::config::RssConfig;

/// Render the feed document, newest entry first
pub fn render_rss(config: &RssConfig, entries: &[SummaryEntry]) -> Result<String> {
    let mut sorted: Vec<&SummaryEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &config.title)?;
    text_element(&mut writer, "link", &config.link)?;
    text_element(&mut writer, "description", &config.description)?;
    if let Some(latest) = sorted.first() {
        text_element(&mut writer, "lastBuildDate", &latest.timestamp.to_rfc2822())?;
    }

    for entry in sorted {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &entry.title)?;
        text_element(&mut writer, "link", &entry.link)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&entry.id)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "pubDate", &entry.timestamp.to_rfc2822())?;
        writer
            .create_element("description")
            .write_cdata_content(BytesCData::new(cdata_safe(&markdown_to_html(&entry.content))))?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).context("feed is not valid UTF-8")
}

fn text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Render summary markdown as an HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Split any `]]>` so it cannot close the CDATA section early
fn cdata_safe(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}

/// Adds each run's summaries to the cache and regenerates the feed file
pub struct FeedPublisher {
    cache: Arc<SummaryCache>,
    config: RssConfig,
    output_dir: PathBuf,
}

impl FeedPublisher {
    pub fn new(cache: Arc<SummaryCache>, config: RssConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            config,
            output_dir: output_dir.into(),
        }
    }

    pub fn feed_path(&self) -> PathBuf {
        self.output_dir.join(&self.config.filename)
    }
}

#[async_trait]
impl SummarySink for FeedPublisher {
    async fn publish(&self, entries: &[SummaryEntry]) -> Result<()> {
        let update = self.cache.add_batch(entries, self.config.max_entries).await?;
        let feed = render_rss(&self.config, &update.entries)?;

        let path = self.feed_path();
        ghsum_common::write_atomic(path.clone(), feed.into_bytes())
            .await
            .with_context(|| format!("writing feed {}", path.display()))?;

        info!(
            added = update.added,
            entries = update.entries.len(),
            path = %path.display(),
            "RSS feed regenerated"
        );
        Ok(())
    }
}
