//! # 结果表格与报告
//!
//! 把处理结果与探测结果整理成终端表格，以及写出 CSV 报告。
//!
//! ## 依赖关系
//! - 被 `commands/organise.rs`, `commands/probe.rs` 使用
//! - 使用 `tabled` 渲染表格, `csv` 写出报告

use crate::error::{OrganiserError, Result};
use crate::models::metadata::quality_label;
use crate::models::{FileMetadata, ProcessingResult};

use std::path::Path;
use tabled::Tabled;

/// 处理结果表格行
#[derive(Debug, Clone, Tabled)]
pub struct ResultRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Type")]
    pub media_type: String,
    #[tabled(rename = "Info")]
    pub info: String,
    #[tabled(rename = "Quality")]
    pub quality: String,
    #[tabled(rename = "Destination / Reason")]
    pub destination: String,
}

/// 探测结果表格行
#[derive(Debug, Clone, Tabled)]
pub struct ProbeRow {
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Duration")]
    pub duration: String,
    #[tabled(rename = "Resolution")]
    pub resolution: String,
    #[tabled(rename = "Codec")]
    pub codec: String,
    #[tabled(rename = "Quality")]
    pub quality: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// 结果状态："error" / "skipped" / "ok"
pub fn status_label(result: &ProcessingResult) -> &'static str {
    if result.error.is_some() {
        "error"
    } else if result.skipped {
        "skipped"
    } else {
        "ok"
    }
}

/// 人类可读的文件大小
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// 时长格式化为 H:MM:SS
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 生成结果表格行；目标路径显示为相对 `target_root` 的路径
pub fn result_rows<'a>(
    results: impl IntoIterator<Item = &'a ProcessingResult>,
    target_root: &Path,
) -> Vec<ResultRow> {
    results
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let destination = match (&r.new_path, &r.error, &r.skip_reason) {
                (_, Some(error), _) => error.clone(),
                (Some(dest), None, _) => dest
                    .strip_prefix(target_root)
                    .unwrap_or(dest)
                    .display()
                    .to_string(),
                (None, None, Some(reason)) => reason.clone(),
                (None, None, None) => "-".to_string(),
            };
            ResultRow {
                index: i + 1,
                status: status_label(r).to_string(),
                file: file_name(&r.original_path),
                media_type: r.media_type.to_string(),
                info: r.episode_info.clone(),
                quality: quality_label(r.quality()).to_string(),
                destination,
            }
        })
        .collect()
}

/// 生成探测结果表格行
pub fn probe_rows(metadata: &[FileMetadata]) -> Vec<ProbeRow> {
    metadata
        .iter()
        .map(|m| ProbeRow {
            file: file_name(&m.path),
            duration: m.duration.map(format_duration).unwrap_or_else(|| "-".into()),
            resolution: m.resolution().unwrap_or_else(|| "-".into()),
            codec: m.codec.clone().unwrap_or_else(|| "-".into()),
            quality: quality_label(m.quality).to_string(),
            size: m.file_size.map(format_size).unwrap_or_else(|| "-".into()),
            status: m.error.clone().unwrap_or_else(|| "ok".into()),
        })
        .collect()
}

/// 保存全部结果到 CSV
pub fn save_results_csv(results: &[ProcessingResult], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(OrganiserError::CsvError)?;

    wtr.write_record([
        "original_path",
        "new_path",
        "status",
        "media_type",
        "show_name",
        "episode_info",
        "is_extra",
        "quality",
        "confidence",
        "file_size",
        "error",
        "skip_reason",
    ])
    .map_err(OrganiserError::CsvError)?;

    for r in results {
        wtr.write_record([
            r.original_path.display().to_string(),
            r.new_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            status_label(r).to_string(),
            r.media_type.to_string(),
            r.show_name.clone(),
            r.episode_info.clone(),
            r.is_extra.to_string(),
            r.quality().to_string(),
            format!("{:.2}", r.metadata.confidence),
            r.file_size().map(|s| s.to_string()).unwrap_or_default(),
            r.error.clone().unwrap_or_default(),
            r.skip_reason.clone().unwrap_or_default(),
        ])
        .map_err(OrganiserError::CsvError)?;
    }

    wtr.flush().map_err(|e| OrganiserError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metadata::QUALITY_FULL_HD;
    use std::path::PathBuf;

    fn result(name: &str) -> ProcessingResult {
        let mut meta = FileMetadata::failed(format!("/src/{}", name), "x");
        meta.error = None;
        meta.quality = QUALITY_FULL_HD;
        ProcessingResult::new(meta)
    }

    #[test]
    fn test_status_and_destination_columns() {
        let mut ok = result("a.mkv");
        ok.new_path = Some(PathBuf::from("/lib/Movies/A/A.mkv"));
        let mut dup = result("b.mkv");
        dup.mark_skipped("duplicate of /src/c.mkv");
        let mut bad = result("d.mkv");
        bad.mark_failed("unclassified");
        bad.mark_skipped("unclassified");

        let rows = result_rows(&[ok, dup, bad], Path::new("/lib"));
        assert_eq!(rows[0].status, "ok");
        assert_eq!(rows[0].destination, "Movies/A/A.mkv");
        assert_eq!(rows[0].quality, "1080p");
        assert_eq!(rows[1].status, "skipped");
        assert_eq!(rows[1].destination, "duplicate of /src/c.mkv");
        assert_eq!(rows[2].status, "error");
        assert_eq!(rows[2].index, 3);
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GiB");
        assert_eq!(format_duration(3725.4), "1:02:05");
        assert_eq!(format_duration(59.6), "0:01:00");
    }

    #[test]
    fn test_probe_rows_show_errors() {
        let meta = FileMetadata::failed("/src/x.mkv", "timeout");
        let rows = probe_rows(&[meta]);
        assert_eq!(rows[0].file, "x.mkv");
        assert_eq!(rows[0].duration, "-");
        assert_eq!(rows[0].status, "timeout");
    }

    #[test]
    fn test_save_results_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut ok = result("a.mkv");
        ok.new_path = Some(PathBuf::from("/lib/a.mkv"));
        let mut bad = result("b.mkv");
        bad.mark_failed("classification failed: 503");

        save_results_csv(&[ok, bad], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "original_path");
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "/lib/a.mkv");
        assert_eq!(&records[0][2], "ok");
        assert_eq!(&records[1][2], "error");
        assert_eq!(&records[1][10], "classification failed: 503");
    }
}
