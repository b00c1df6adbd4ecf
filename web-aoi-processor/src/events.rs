//! Browser event parsing
//!
//! The browser relay records one text line per event using the grammar
//! `name[arg,...]=value`, where both the bracketed arguments and the
//! `=value` suffix are optional. Lines are first split into a
//! [`RawEvent`] and then decoded once into a typed [`BrowserEvent`].
//!
//! ## Recognized events
//! - `browser_url[tab,load]=<url>`: navigation within a tab
//! - `browser_tab=<tab>`: tab switched or focused
//! - `browser_scroll[tab,load]=x,y`: scroll offset, makes the tab active
//! - `browser_size=w,h`: viewport size shared by all tabs
//! - `aoi[tab,load,name]=x,y,w,h`: AOI bounding box in page pixels
//! - `marker[tab,load,id]=x,y,w,h`: fiducial marker bounding box in page pixels
//!
//! Any other name decodes to [`BrowserEvent::Unknown`].

use crate::types::{Rect, Result, ViewportSize, WebAoiError};
use regex::Regex;

/// Event line split into its grammar parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent<'a> {
    pub name: &'a str,
    pub args: Option<Vec<&'a str>>,
    pub value: Option<&'a str>,
}

/// A typed browser event
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    /// A tab navigated to a new URL
    Url { tab_id: usize, url: String },
    /// A tab became the focused tab
    TabSwitched { tab_id: usize },
    /// Scroll offset of a tab changed
    Scroll { tab_id: usize, x: f64, y: f64 },
    /// Browser viewport was resized
    Resize(ViewportSize),
    /// An AOI bounding box was (re)defined
    Aoi {
        tab_id: usize,
        load_id: String,
        name: String,
        bounds: Rect,
    },
    /// A fiducial marker bounding box was (re)defined
    Marker {
        tab_id: usize,
        load_id: String,
        marker_id: u32,
        bounds: Rect,
    },
    /// An event name this processor does not know about
    Unknown { name: String },
}

impl BrowserEvent {
    /// The tab this event refers to, if any
    pub fn tab_id(&self) -> Option<usize> {
        match self {
            BrowserEvent::Url { tab_id, .. }
            | BrowserEvent::TabSwitched { tab_id }
            | BrowserEvent::Scroll { tab_id, .. }
            | BrowserEvent::Aoi { tab_id, .. }
            | BrowserEvent::Marker { tab_id, .. } => Some(*tab_id),
            BrowserEvent::Resize(_) | BrowserEvent::Unknown { .. } => None,
        }
    }
}

/// Parser for event lines
pub struct EventParser {
    pattern: Regex,
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^(?P<name>[^\[=]+)(?:\[(?P<args>[^\]]*)\])?(?:=(?P<value>.*))?$")
                .expect("event grammar is a valid regex"),
        }
    }

    /// Split a line into name, args and value
    ///
    /// Returns `None` if the line does not follow the event grammar.
    pub fn split<'a>(&self, line: &'a str) -> Option<RawEvent<'a>> {
        let captures = self.pattern.captures(line.trim_end_matches('\r'))?;

        let name = captures.name("name")?.as_str();
        let args = captures
            .name("args")
            .map(|m| m.as_str().split(',').collect::<Vec<_>>());
        let value = captures.name("value").map(|m| m.as_str());

        Some(RawEvent { name, args, value })
    }

    /// Parse a line into a typed event
    ///
    /// # Returns
    /// * `Ok(None)` if the line does not follow the event grammar
    /// * `Ok(Some(event))` for well-formed lines, including unknown names
    /// * `Err(EventParseError)` if a known event carries a malformed payload
    pub fn parse(&self, line: &str) -> Result<Option<BrowserEvent>> {
        let Some(raw) = self.split(line) else {
            return Ok(None);
        };
        decode(&raw).map(Some)
    }
}

fn decode(raw: &RawEvent<'_>) -> Result<BrowserEvent> {
    match raw.name {
        "browser_url" => {
            let args = expect_args(raw, 1)?;
            Ok(BrowserEvent::Url {
                tab_id: parse_tab_id(args[0])?,
                url: raw.value.unwrap_or_default().to_string(),
            })
        }
        "browser_tab" => {
            let value = expect_value(raw)?;
            Ok(BrowserEvent::TabSwitched {
                tab_id: parse_tab_id(value)?,
            })
        }
        "browser_scroll" => {
            let args = expect_args(raw, 1)?;
            let [x, y] = parse_floats::<2>(expect_value(raw)?)?;
            Ok(BrowserEvent::Scroll {
                tab_id: parse_tab_id(args[0])?,
                x,
                y,
            })
        }
        "browser_size" => {
            let value = expect_value(raw)?;
            let sizes = value
                .split(',')
                .map(|v| v.trim().parse::<u32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| malformed(raw, &format!("bad size {:?}: {}", value, e)))?;
            match sizes.as_slice() {
                [width, height] => Ok(BrowserEvent::Resize(ViewportSize::new(*width, *height))),
                _ => Err(malformed(raw, "expected width,height")),
            }
        }
        "aoi" => {
            let args = expect_args(raw, 3)?;
            let [x, y, w, h] = parse_floats::<4>(expect_value(raw)?)?;
            Ok(BrowserEvent::Aoi {
                tab_id: parse_tab_id(args[0])?,
                load_id: args[1].trim().to_string(),
                // AOI names may themselves contain commas
                name: args[2..].join(","),
                bounds: Rect::new(x, y, w, h),
            })
        }
        "marker" => {
            let args = expect_args(raw, 3)?;
            let marker_id = args[2].trim().parse::<u32>().map_err(|e| {
                malformed(raw, &format!("bad marker id {:?}: {}", args[2], e))
            })?;
            let [x, y, w, h] = parse_floats::<4>(expect_value(raw)?)?;
            Ok(BrowserEvent::Marker {
                tab_id: parse_tab_id(args[0])?,
                load_id: args[1].trim().to_string(),
                marker_id,
                bounds: Rect::new(x, y, w, h),
            })
        }
        other => Ok(BrowserEvent::Unknown {
            name: other.to_string(),
        }),
    }
}

fn malformed(raw: &RawEvent<'_>, reason: &str) -> WebAoiError {
    WebAoiError::EventParseError(format!("{}: {}", raw.name, reason))
}

fn expect_args<'r, 'a>(raw: &'r RawEvent<'a>, min: usize) -> Result<&'r [&'a str]> {
    match &raw.args {
        Some(args) if args.len() >= min => Ok(args.as_slice()),
        Some(args) => Err(malformed(
            raw,
            &format!("expected at least {} args, got {}", min, args.len()),
        )),
        None => Err(malformed(raw, "missing [args]")),
    }
}

fn expect_value<'a>(raw: &RawEvent<'a>) -> Result<&'a str> {
    raw.value.ok_or_else(|| malformed(raw, "missing =value"))
}

fn parse_tab_id(text: &str) -> Result<usize> {
    text.trim()
        .parse::<usize>()
        .map_err(|e| WebAoiError::EventParseError(format!("bad tab id {:?}: {}", text, e)))
}

fn parse_floats<const N: usize>(text: &str) -> Result<[f64; N]> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| WebAoiError::EventParseError(format!("bad number in {:?}: {}", text, e)))?;

    values.try_into().map_err(|values: Vec<f64>| {
        WebAoiError::EventParseError(format!(
            "expected {} values, got {} in {:?}",
            N,
            values.len(),
            text
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_full_grammar() {
        let parser = EventParser::new();
        let raw = parser.split("marker[0,1,2]=10,20,30,40").unwrap();
        assert_eq!(raw.name, "marker");
        assert_eq!(raw.args, Some(vec!["0", "1", "2"]));
        assert_eq!(raw.value, Some("10,20,30,40"));
    }

    #[test]
    fn test_split_optional_parts() {
        let parser = EventParser::new();

        let raw = parser.split("browser_size=1280,720").unwrap();
        assert_eq!(raw.args, None);
        assert_eq!(raw.value, Some("1280,720"));

        let raw = parser.split("recording.begin").unwrap();
        assert_eq!(raw.name, "recording.begin");
        assert_eq!(raw.args, None);
        assert_eq!(raw.value, None);
    }

    #[test]
    fn test_url_value_keeps_equals_signs() {
        let parser = EventParser::new();
        let event = parser
            .parse("browser_url[2,0]=https://example.com/?q=a&b=c")
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            BrowserEvent::Url {
                tab_id: 2,
                url: "https://example.com/?q=a&b=c".to_string()
            }
        );
    }

    #[test]
    fn test_grammar_mismatch_is_none() {
        let parser = EventParser::new();
        assert_eq!(parser.parse("").unwrap(), None);
        assert_eq!(parser.parse("[0]=1").unwrap(), None);
        assert_eq!(parser.parse("aoi[0,0,x]trailing").unwrap(), None);
    }

    #[test]
    fn test_garbage_is_unknown_not_error() {
        let parser = EventParser::new();
        let event = parser.parse("garbage text !!").unwrap().unwrap();
        assert_eq!(
            event,
            BrowserEvent::Unknown {
                name: "garbage text !!".to_string()
            }
        );
    }

    #[test]
    fn test_aoi_event() {
        let parser = EventParser::new();
        let event = parser.parse("aoi[0,0,banner]=10,10,200,50").unwrap().unwrap();
        assert_eq!(
            event,
            BrowserEvent::Aoi {
                tab_id: 0,
                load_id: "0".to_string(),
                name: "banner".to_string(),
                bounds: Rect::new(10.0, 10.0, 200.0, 50.0),
            }
        );
    }

    #[test]
    fn test_marker_and_scroll_events() {
        let parser = EventParser::new();

        let marker = parser.parse("marker[1,3,2]=5.5,6,100,100").unwrap().unwrap();
        assert_eq!(
            marker,
            BrowserEvent::Marker {
                tab_id: 1,
                load_id: "3".to_string(),
                marker_id: 2,
                bounds: Rect::new(5.5, 6.0, 100.0, 100.0),
            }
        );

        let scroll = parser.parse("browser_scroll[1,3]=0,250.5").unwrap().unwrap();
        assert_eq!(
            scroll,
            BrowserEvent::Scroll {
                tab_id: 1,
                x: 0.0,
                y: 250.5
            }
        );
        assert_eq!(scroll.tab_id(), Some(1));
    }

    #[test]
    fn test_resize_and_tab_switch() {
        let parser = EventParser::new();
        assert_eq!(
            parser.parse("browser_size=1920,1080").unwrap().unwrap(),
            BrowserEvent::Resize(ViewportSize::new(1920, 1080))
        );
        assert_eq!(
            parser.parse("browser_tab=4").unwrap().unwrap(),
            BrowserEvent::TabSwitched { tab_id: 4 }
        );
    }

    #[test]
    fn test_malformed_payloads_are_errors() {
        let parser = EventParser::new();
        assert!(parser.parse("marker[0,0]=1,2,3,4").is_err());
        assert!(parser.parse("marker[0,0,a]=1,2,3,4").is_err());
        assert!(parser.parse("aoi[0,0,x]=1,2,3").is_err());
        assert!(parser.parse("browser_scroll[x]=1,2").is_err());
        assert!(parser.parse("browser_size=wide,tall").is_err());
        assert!(parser.parse("browser_size").is_err());
    }
}
