//! Stack trace parsing.
//!
//! Turns raw trace text into the ordered list of application frames every
//! resolution strategy works from.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::OwnershipConfig;
use crate::error::{Result, TriageError};

/// One call site parsed from a stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Source file path exactly as it appears in the trace
    pub file_path: String,
    pub line_number: u32,
    /// The full trace line the frame was parsed from
    pub raw_text: String,
}

impl Frame {
    pub fn new(file_path: impl Into<String>, line_number: u32) -> Self {
        let file_path = file_path.into();
        Self {
            raw_text: format!("{file_path}:{line_number}"),
            file_path,
            line_number,
        }
    }

    /// Path segments, ignoring empty components from leading or doubled slashes.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.file_path.split('/').filter(|s| !s.is_empty())
    }

    /// The frame path relative to `root` when it is an absolute path beneath
    /// it, otherwise the path as written in the trace.
    pub fn repo_relative_path(&self, root: &Path) -> &str {
        let path = Path::new(&self.file_path);
        if path.is_absolute() {
            if let Ok(root) = std::path::absolute(root) {
                if let Ok(stripped) = path.strip_prefix(&root) {
                    if let Some(s) = stripped.to_str() {
                        // strip_prefix yields a suffix of the original string
                        let start = self.file_path.len() - s.len();
                        return &self.file_path[start..];
                    }
                }
            }
        }
        self.file_path.trim_start_matches("./")
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_number)
    }
}

/// Parses trace text into application frames.
///
/// A frame line looks like `<path>.<ext>:<line>[:...]`, optionally prefixed
/// by whitespace or `from `. Lines that don't match are skipped. Frames are
/// kept only when some path segment is an application root and no segment is
/// a dependency marker; an empty root list accepts every non-dependency frame.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    line_pattern: Regex,
    app_roots: Vec<String>,
    dependency_markers: Vec<String>,
}

impl FrameExtractor {
    pub fn new(
        source_extensions: &[String],
        app_roots: Vec<String>,
        dependency_markers: Vec<String>,
    ) -> Result<Self> {
        let extensions = source_extensions
            .iter()
            .map(|ext| regex::escape(ext.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"^\s*(?:from\s+)?([^:\s][^:]*\.(?:{extensions})):(\d+)(?::|\s|$)");
        let line_pattern = Regex::new(&pattern).map_err(|e| TriageError::InvalidPattern {
            pattern,
            cause: e.to_string(),
        })?;

        Ok(Self {
            line_pattern,
            app_roots,
            dependency_markers,
        })
    }

    pub fn from_config(config: &OwnershipConfig) -> Result<Self> {
        Self::new(
            &config.source_extensions,
            config.app_roots.clone(),
            config.dependency_markers.clone(),
        )
    }

    /// Extract application frames in trace order.
    ///
    /// `None` and blank input both yield an empty list.
    pub fn extract(&self, stack_trace: Option<&str>) -> Vec<Frame> {
        let Some(text) = stack_trace else {
            return Vec::new();
        };

        text.lines()
            .filter_map(|line| self.parse_line(line))
            .filter(|frame| self.is_application_frame(frame))
            .collect()
    }

    /// Parse a single trace line; `None` for anything that isn't a frame.
    pub fn parse_line(&self, line: &str) -> Option<Frame> {
        let captures = self.line_pattern.captures(line)?;
        let file_path = captures.get(1)?.as_str().to_string();
        let line_number = captures.get(2)?.as_str().parse().ok()?;
        Some(Frame {
            file_path,
            line_number,
            raw_text: line.to_string(),
        })
    }

    pub fn is_application_frame(&self, frame: &Frame) -> bool {
        let mut in_app = self.app_roots.is_empty();
        for segment in frame.segments() {
            if self.dependency_markers.iter().any(|m| m == segment) {
                return false;
            }
            if self.app_roots.iter().any(|r| r == segment) {
                in_app = true;
            }
        }
        in_app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> FrameExtractor {
        FrameExtractor::from_config(&OwnershipConfig::default()).unwrap()
    }

    fn paths(frames: &[Frame]) -> Vec<(&str, u32)> {
        frames
            .iter()
            .map(|f| (f.file_path.as_str(), f.line_number))
            .collect()
    }

    #[test]
    fn test_extracts_only_application_frames_in_order() {
        let trace = "app/controllers/users_controller.rb:10:in `index'\n\
                     app/models/user.rb:25:in `find_user'\n\
                     /gems/activerecord/lib/active_record.rb:123\n\
                     /vendor/bundle/gems/rack.rb:45";
        let frames = extractor().extract(Some(trace));

        assert_eq!(
            paths(&frames),
            vec![
                ("app/controllers/users_controller.rb", 10),
                ("app/models/user.rb", 25),
            ]
        );
        assert_eq!(
            frames[0].raw_text,
            "app/controllers/users_controller.rb:10:in `index'"
        );
    }

    #[test]
    fn test_empty_and_absent_traces() {
        let extractor = extractor();
        assert!(extractor.extract(None).is_empty());
        assert!(extractor.extract(Some("")).is_empty());
        assert!(extractor.extract(Some("\n\n")).is_empty());
    }

    #[test]
    fn test_dependency_only_trace_is_empty() {
        let extractor = extractor();
        assert!(extractor.extract(Some("/gems/rack/lib/rack.rb:45")).is_empty());
    }

    #[test]
    fn test_gem_with_app_directory_is_still_dependency() {
        let extractor = extractor();
        let trace = "/usr/lib/ruby/gems/3.2.0/gems/devise/app/controllers/devise_controller.rb:12";
        assert!(extractor.extract(Some(trace)).is_empty());
    }

    #[test]
    fn test_non_frame_lines_are_skipped() {
        let trace = "NoMethodError: undefined method `name' for nil\n\
                     \tfrom /srv/shop/app/models/order.rb:7:in `total'\n\
                     app/views/orders/show.html.erb:3\n\
                     app/models/order.rb:notanumber\n\
                     app/models/order.rb:99999999999999";
        let frames = extractor().extract(Some(trace));
        assert_eq!(paths(&frames), vec![("/srv/shop/app/models/order.rb", 7)]);
    }

    #[test]
    fn test_custom_extensions_and_roots() {
        let extractor = FrameExtractor::new(
            &["py".to_string(), ".pyx".to_string()],
            vec!["src".to_string()],
            vec!["site-packages".to_string()],
        )
        .unwrap();
        let trace = "src/billing/invoice.py:40\n\
                     /usr/lib/python3/site-packages/src/x.py:1\n\
                     src/fast/kernel.pyx:8";
        assert_eq!(
            paths(&extractor.extract(Some(trace))),
            vec![("src/billing/invoice.py", 40), ("src/fast/kernel.pyx", 8)]
        );
    }

    #[test]
    fn test_repo_relative_path() {
        let frame = Frame::new("/srv/shop/app/models/order.rb", 7);
        assert_eq!(
            frame.repo_relative_path(Path::new("/srv/shop")),
            "app/models/order.rb"
        );
        assert_eq!(
            frame.repo_relative_path(Path::new("/elsewhere")),
            "/srv/shop/app/models/order.rb"
        );

        let relative = Frame::new("./app/models/order.rb", 7);
        assert_eq!(
            relative.repo_relative_path(Path::new("/srv/shop")),
            "app/models/order.rb"
        );
    }
}
