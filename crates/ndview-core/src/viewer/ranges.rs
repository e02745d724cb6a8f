use std::collections::BTreeMap;

use crate::consts::{CHANNEL_AXIS, NO_CHANNEL};
use crate::source::{AxisPosition, AxisPositions};

/// Observed extent of every axis, grown as new images arrive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisRanges {
    integer: BTreeMap<String, (i64, i64)>,
    string: BTreeMap<String, Vec<String>>,
    channels: Vec<String>,
}

impl AxisRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the ranges to cover `axes`. Returns channel names seen for the
    /// first time.
    pub fn include(&mut self, axes: &AxisPositions) -> Vec<String> {
        let mut new_channels = Vec::new();
        for (axis, position) in axes {
            if axis == CHANNEL_AXIS {
                let name = position.to_string();
                if !self.channels.contains(&name) {
                    self.channels.push(name.clone());
                    new_channels.push(name);
                }
                continue;
            }
            match position {
                AxisPosition::Int(v) => {
                    let range = self.integer.entry(axis.clone()).or_insert((*v, *v));
                    range.0 = range.0.min(*v);
                    range.1 = range.1.max(*v);
                }
                AxisPosition::Str(s) => {
                    let values = self.string.entry(axis.clone()).or_default();
                    if !values.contains(s) {
                        values.push(s.clone());
                    }
                }
            }
        }
        new_channels
    }

    /// Inclusive `(min, max)` of an integer axis.
    pub fn range(&self, axis: &str) -> Option<(i64, i64)> {
        self.integer.get(axis).copied()
    }

    /// Values of a named axis in order of first appearance.
    pub fn string_values(&self, axis: &str) -> Option<&[String]> {
        self.string.get(axis).map(Vec::as_slice)
    }

    pub fn integer_axes(&self) -> impl Iterator<Item = &str> {
        self.integer.keys().map(String::as_str)
    }

    pub fn is_integer_axis(&self, axis: &str) -> bool {
        self.integer.contains_key(axis)
    }

    /// Channels in order of first appearance.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Channels to display; a dataset without a channel axis has one unnamed
    /// channel.
    pub fn display_channels(&self) -> Vec<String> {
        if self.channels.is_empty() {
            vec![NO_CHANNEL.to_string()]
        } else {
            self.channels.clone()
        }
    }

    pub fn remove_channel(&mut self, name: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| c != name);
        self.channels.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::axes;

    #[test]
    fn test_include_grows_ranges_and_reports_new_channels() {
        let mut ranges = AxisRanges::new();
        let first = ranges.include(&axes([("z", AxisPosition::from(3)), ("channel", "DAPI".into())]));
        assert_eq!(first, vec!["DAPI".to_string()]);
        let again = ranges.include(&axes([("z", AxisPosition::from(-1)), ("channel", "DAPI".into())]));
        assert!(again.is_empty());
        assert_eq!(ranges.range("z"), Some((-1, 3)));
    }

    #[test]
    fn test_no_channel_axis_shows_unnamed_channel() {
        let mut ranges = AxisRanges::new();
        ranges.include(&axes([("t", 0)]));
        assert_eq!(ranges.display_channels(), vec![String::new()]);
    }
}
