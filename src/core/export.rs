use crate::core::models::{AnalyzedVideo, ChannelGrowthRecord, ItemStatus, VideoListItem};
use crate::error::{Error, Result};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const BOM: &[u8] = "\u{feff}".as_bytes();
const REPORT_WIDTH: usize = 100;
const MAX_TITLE_CHARS: usize = 50;

const VIDEO_HEADERS: [&str; 10] = [
    "Rank",
    "Video Title",
    "Video URL",
    "Channel Name",
    "Channel URL",
    "Views",
    "Channel Avg Views",
    "Ratio",
    "Comments Summary",
    "Video Summary",
];

fn csv_writer<W: Write>(mut out: W) -> Result<csv::Writer<W>> {
    out.write_all(BOM)?;
    Ok(csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out))
}

/// Rows in the order given; ranks follow that order.
pub fn write_video_csv<W: Write>(out: W, results: &[AnalyzedVideo]) -> Result<()> {
    let mut writer = csv_writer(out)?;
    writer.write_record(VIDEO_HEADERS)?;

    for (index, video) in results.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            video.video.title.clone(),
            video.url(),
            video.channel_name.clone(),
            video.channel_url(),
            video.video.view_count.to_string(),
            format!("{:.0}", video.channel_average_views.round()),
            format!("{:.2}", video.ratio),
            markdown_to_plain(&video.comments_summary),
            video
                .video_summary
                .as_deref()
                .map(markdown_to_plain)
                .unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_growth_csv<W: Write>(out: W, records: &[ChannelGrowthRecord], days: u32) -> Result<()> {
    let mut writer = csv_writer(out)?;
    writer.write_record([
        "Rank".to_string(),
        "Channel Name".to_string(),
        "Channel URL".to_string(),
        "Growth (%)".to_string(),
        format!("Avg Views (last {days} days)"),
        "Avg Views (previous period)".to_string(),
        "Videos (current)".to_string(),
        "Videos (previous)".to_string(),
    ])?;

    for record in records {
        writer.write_record([
            record.rank.to_string(),
            record.channel_name.clone(),
            record.channel_url(),
            record.growth.to_string(),
            format!("{:.0}", record.current_period_avg_views.round()),
            format!("{:.0}", record.previous_period_avg_views.round()),
            record.current_video_count.to_string(),
            record.previous_video_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_videos(path: &Path, results: &[AnalyzedVideo]) -> Result<()> {
    if results.is_empty() {
        return Err(Error::validation("There are no analysis results to export"));
    }
    write_video_csv(BufWriter::new(File::create(path)?), results)?;
    info!(path = %path.display(), rows = results.len(), "video analysis exported");
    Ok(())
}

pub fn export_growth(path: &Path, records: &[ChannelGrowthRecord], days: u32) -> Result<()> {
    if records.is_empty() {
        return Err(Error::validation("There are no growth results to export"));
    }
    write_growth_csv(BufWriter::new(File::create(path)?), records, days)?;
    info!(path = %path.display(), rows = records.len(), "channel growth exported");
    Ok(())
}

/// Parse exported CSV text back into rows, header included.
pub fn read_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Flatten Markdown to plain text: markup dropped, list items kept as `- ` lines.
pub fn markdown_to_plain(markdown: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Start(Tag::Item) => out.push_str("- "),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => out.push('\n'),
            _ => {}
        }
    }

    out.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `analysis_<title>.txt`, the title reduced to ASCII alphanumerics and underscores.
pub fn report_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .take(MAX_TITLE_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("analysis_{stem}.txt")
}

/// Plaintext report of one analyzed video from a video-list run.
pub fn video_report_text(item: &VideoListItem) -> Result<String> {
    let (ItemStatus::Completed, Some(details)) = (&item.status, &item.details) else {
        return Err(Error::validation("Only completed videos can be exported"));
    };

    let url = item.url().unwrap_or_else(|| item.input.clone());
    let tags = if details.tags.is_empty() {
        "(none)".to_string()
    } else {
        details.tags.join(", ")
    };
    let description = if details.description.trim().is_empty() {
        "(none)".to_string()
    } else {
        textwrap::fill(details.description.trim(), REPORT_WIDTH)
    };

    let mut report = String::new();
    report.push_str(&format!("URL: {url}\n"));
    report.push_str(&format!("Title: {}\n\n", details.title));
    report.push_str(&format!("Description:\n{description}\n\n"));
    report.push_str(&format!("Tags: {tags}\n\n"));
    report.push_str("Audience insight:\n");
    report.push_str(&textwrap::fill(
        &markdown_to_plain(&item.audience_insight),
        REPORT_WIDTH,
    ));
    report.push_str(&format!("\n\nComments ({}):\n", item.comments.len()));

    for (index, comment) in item.comments.iter().enumerate() {
        let prefix = format!("{}. ", index + 1);
        let options = textwrap::Options::new(REPORT_WIDTH)
            .initial_indent(&prefix)
            .subsequent_indent("   ");
        report.push_str(&textwrap::fill(comment.trim(), options));
        report.push('\n');
    }

    Ok(report)
}

pub fn export_video_report(dir: &Path, item: &VideoListItem) -> Result<std::path::PathBuf> {
    let text = video_report_text(item)?;
    let path = dir.join(report_file_name(item.title()));
    std::fs::write(&path, text)?;
    info!(path = %path.display(), "video report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Video, VideoDetails};
    use crate::core::stats::Growth;
    use pretty_assertions::assert_eq;

    fn analyzed(title: &str) -> AnalyzedVideo {
        AnalyzedVideo {
            video: Video {
                id: "abc123def45".into(),
                title: title.into(),
                view_count: 1500,
                thumbnail_url: String::new(),
            },
            channel_id: "UC123".into(),
            channel_name: "Chan".into(),
            channel_average_views: 612.6,
            ratio: 2.44857,
            comments_summary: "**Positive** overall.\n\n- loved it\n- wants more".into(),
            video_summary: None,
        }
    }

    fn written(results: &[AnalyzedVideo]) -> String {
        let mut buffer = Vec::new();
        write_video_csv(&mut buffer, results).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn tricky_titles_round_trip() {
        let title = "Title, \"cool\"";
        let text = written(&[analyzed(title)]);

        assert!(text.starts_with('\u{feff}'));
        assert!(text.contains("\"Title, \"\"cool\"\"\""));

        let rows = read_csv(&text).unwrap();
        assert_eq!(rows[0], VIDEO_HEADERS.map(String::from).to_vec());
        assert_eq!(rows[1][1], title);
    }

    #[test]
    fn video_rows_are_formatted() {
        let rows = read_csv(&written(&[analyzed("t")])).unwrap();
        let row = &rows[1];

        assert_eq!(row[0], "1");
        assert_eq!(row[2], "https://www.youtube.com/watch?v=abc123def45");
        assert_eq!(row[4], "https://www.youtube.com/channel/UC123");
        assert_eq!(row[5], "1500");
        assert_eq!(row[6], "613");
        assert_eq!(row[7], "2.45");
        assert_eq!(row[8], "Positive overall.\n- loved it\n- wants more");
        assert_eq!(row[9], "");
    }

    #[test]
    fn records_end_with_a_bare_newline() {
        let text = written(&[analyzed("t")]);
        assert!(!text.contains('\r'));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn growth_rows_show_infinity() {
        let records = vec![ChannelGrowthRecord {
            rank: 1,
            channel_id: "UCn".into(),
            channel_name: "New".into(),
            current_period_avg_views: 10.4,
            previous_period_avg_views: 0.0,
            growth: Growth::Infinite,
            current_video_count: 3,
            previous_video_count: 0,
        }];
        let mut buffer = Vec::new();
        write_growth_csv(&mut buffer, &records, 14).unwrap();
        let rows = read_csv(&String::from_utf8(buffer).unwrap()).unwrap();

        assert_eq!(rows[0][4], "Avg Views (last 14 days)");
        assert_eq!(
            rows[1],
            vec!["1", "New", "https://www.youtube.com/channel/UCn", "Infinity", "10", "0", "3", "0"]
        );
    }

    #[test]
    fn report_file_names_are_safe() {
        assert_eq!(report_file_name("Hello, World!"), "analysis_Hello__World_.txt");
        let long = report_file_name(&"x".repeat(80));
        assert_eq!(long.len(), "analysis_".len() + 50 + ".txt".len());
    }

    #[test]
    fn video_report_lists_everything() {
        let item = VideoListItem {
            input: "https://youtu.be/abc123def45".into(),
            video_id: Some("abc123def45".into()),
            status: ItemStatus::Completed,
            details: Some(VideoDetails {
                id: "abc123def45".into(),
                title: "My video".into(),
                description: "About things".into(),
                tags: vec!["rust".into(), "tui".into()],
                ..VideoDetails::default()
            }),
            comments: vec!["first!".into(), "nice".into()],
            audience_insight: "## Who\nDevelopers".into(),
        };

        let report = video_report_text(&item).unwrap();
        assert!(report.starts_with("URL: https://www.youtube.com/watch?v=abc123def45\nTitle: My video"));
        assert!(report.contains("Tags: rust, tui"));
        assert!(report.contains("Audience insight:\nWho\nDevelopers"));
        assert!(report.contains("Comments (2):\n1. first!\n2. nice\n"));
    }

    #[test]
    fn unfinished_items_have_no_report() {
        let item = VideoListItem {
            input: "x".into(),
            video_id: None,
            status: ItemStatus::Pending,
            details: None,
            comments: Vec::new(),
            audience_insight: String::new(),
        };
        assert!(video_report_text(&item).is_err());
    }
}
