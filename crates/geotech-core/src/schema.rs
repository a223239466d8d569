//! Structured output schemas.
//!
//! These are the shapes the model is asked to produce. Parsing is
//! all-or-nothing: a missing required field or a non-numeric value in a
//! numeric field fails the whole document, and optional fields that the model
//! leaves out stay `None`. Nothing is ever filled in with a default value
//! except the two collections (`soil_profile`, `test_results`), which are
//! empty when absent or `null`. Numbers must be finite so that every parsed
//! document encodes back to the same value.

use crate::error::SchemaError;
use crate::lenient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A type the model is asked to emit as a JSON object.
pub trait StructuredOutput: Serialize + DeserializeOwned {
    /// Schema name used in errors, logs and metric labels.
    const SCHEMA: &'static str;

    /// Parse JSON text into the schema.
    fn parse(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::from_json(Self::SCHEMA, &e))
    }

    /// Encode to canonical compact JSON. Absent optional fields encode as `null`.
    fn encode(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self).map_err(|e| SchemaError::from_json(Self::SCHEMA, &e))
    }
}

/// One soil layer in a boring log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilLayer {
    /// Top of the layer in meters.
    #[serde(deserialize_with = "lenient::number")]
    pub depth_start: f64,
    /// Bottom of the layer in meters.
    #[serde(deserialize_with = "lenient::number")]
    pub depth_end: f64,
    /// Soil classification (clay, sand, glacial till, ...).
    pub soil_type: String,
    /// Shear strength in kPa.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub strength: Option<f64>,
}

/// Where and for whom the work was done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project location.
    pub location: String,
    /// Client name.
    #[serde(default)]
    pub client: Option<String>,
    /// Report date, kept as free text.
    #[serde(default)]
    pub date: Option<String>,
}

/// Hazard area designations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardInfo {
    /// Erosion hazard status.
    #[serde(default)]
    pub erosion: Option<String>,
    /// Landslide hazard status.
    #[serde(default)]
    pub slide: Option<String>,
    /// Seismic hazard status.
    #[serde(default)]
    pub seismic: Option<String>,
    /// Steep slope hazard status.
    #[serde(default)]
    pub steep_slope: Option<String>,
    /// Watercourse buffer status.
    #[serde(default)]
    pub watercourse_buffer: Option<String>,
}

/// Structured extraction of a geotechnical document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Kind of document (Soil Report, Boring Log, ...).
    pub doc_type: String,
    /// Location, client and date.
    pub project_info: ProjectInfo,
    /// Soil layers in document order.
    #[serde(default, deserialize_with = "lenient::null_as_empty")]
    pub soil_profile: Vec<SoilLayer>,
    /// Groundwater depth in meters.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub groundwater_depth: Option<f64>,
    /// Named test results (`bearing_capacity`, `cohesion`, ...).
    #[serde(default, deserialize_with = "lenient::number_map")]
    pub test_results: BTreeMap<String, f64>,
    /// Free-text confidence: `High`, `Medium` or `Low`, optionally with a reason.
    pub confidence: String,
    /// Recommendations, when the document gives any.
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
    /// Hazard designations.
    #[serde(default)]
    pub hazards: Option<HazardInfo>,
    /// Slope angle in degrees.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub slope_angle: Option<f64>,
    /// Distance to the nearest lake in meters.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub lake_proximity: Option<f64>,
}

impl StructuredOutput for DocumentSummary {
    const SCHEMA: &'static str = "DocumentSummary";
}

/// A generated geotechnical report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Report kind as requested by the caller.
    pub report_type: String,
    /// Executive summary.
    pub executive_summary: String,
    /// Site description.
    pub site_description: String,
    /// Investigation methodology.
    pub methodology: String,
    /// Detailed findings.
    pub findings: String,
    /// Engineering recommendations.
    pub recommendations: String,
}

impl StructuredOutput for Report {
    const SCHEMA: &'static str = "Report";
}

struct OrElse<'a, T>(Option<&'a T>, &'static str);

impl<T: fmt::Display> fmt::Display for OrElse<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str(self.1),
        }
    }
}

fn text_or<'a>(value: Option<&'a String>, fallback: &'static str) -> OrElse<'a, String> {
    OrElse(value.filter(|s| !s.is_empty()), fallback)
}

impl fmt::Display for DocumentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NP: &str = "Not Provided";

        writeln!(f, "**Document Type:** {}", self.doc_type)?;
        writeln!(
            f,
            "**Project Info:** Location: {}, Client: {}, Date: {}",
            self.project_info.location,
            text_or(self.project_info.client.as_ref(), "Unknown"),
            text_or(self.project_info.date.as_ref(), "Unknown"),
        )?;

        writeln!(f, "**Soil Profile:**")?;
        if self.soil_profile.is_empty() {
            writeln!(f, "(No data available)")?;
        }
        for layer in &self.soil_profile {
            writeln!(
                f,
                "- Depth {}-{}m: {}, Strength: {} kPa",
                layer.depth_start,
                layer.depth_end,
                layer.soil_type,
                OrElse(layer.strength.as_ref(), NP),
            )?;
        }

        writeln!(
            f,
            "**Groundwater Depth:** {} m",
            OrElse(self.groundwater_depth.as_ref(), NP)
        )?;

        writeln!(f, "**Test Results:**")?;
        if self.test_results.is_empty() {
            writeln!(f, "(No data available)")?;
        }
        for (name, value) in &self.test_results {
            writeln!(f, "- {name}: {value}")?;
        }

        if let Some(h) = &self.hazards {
            writeln!(f, "**Hazards:**")?;
            writeln!(f, "- Erosion: {}", text_or(h.erosion.as_ref(), NP))?;
            writeln!(f, "- Slide: {}", text_or(h.slide.as_ref(), NP))?;
            writeln!(f, "- Seismic: {}", text_or(h.seismic.as_ref(), NP))?;
            writeln!(f, "- Steep Slope: {}", text_or(h.steep_slope.as_ref(), NP))?;
            writeln!(
                f,
                "- Watercourse Buffer: {}",
                text_or(h.watercourse_buffer.as_ref(), NP)
            )?;
        }

        writeln!(f, "**Slope Angle:** {}°", OrElse(self.slope_angle.as_ref(), NP))?;
        writeln!(
            f,
            "**Lake Proximity:** {} m",
            OrElse(self.lake_proximity.as_ref(), NP)
        )?;
        write!(f, "**Confidence:** {}", self.confidence)?;

        if let Some(recs) = self.recommendations.as_ref().filter(|r| !r.is_empty()) {
            write!(f, "\n**Recommendations:**")?;
            for rec in recs {
                write!(f, "\n- {rec}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.report_type)?;
        writeln!(f, "\n## Executive Summary\n{}", self.executive_summary)?;
        writeln!(f, "\n## Site Description\n{}", self.site_description)?;
        writeln!(f, "\n## Methodology\n{}", self.methodology)?;
        writeln!(f, "\n## Findings\n{}", self.findings)?;
        write!(f, "\n## Recommendations\n{}", self.recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean;

    const FULL: &str = r#"{
        "doc_type": "Geotechnical Report",
        "project_info": {"location": "7547 SE 71st Street, Mercer Island, WA", "client": "Robert Schwartz", "date": "April 11, 2014"},
        "soil_profile": [
            {"depth_start": 0.0, "depth_end": 0.6, "soil_type": "Fill", "strength": null},
            {"depth_start": 0.6, "depth_end": 3.0, "soil_type": "Glacial Till", "strength": "200"}
        ],
        "groundwater_depth": null,
        "test_results": {"bearing_capacity": 150},
        "confidence": "High - clear site data",
        "recommendations": ["Use spread footings"],
        "hazards": {"erosion": "Yes", "slide": null, "seismic": "No", "steep_slope": null, "watercourse_buffer": null},
        "slope_angle": 15,
        "lake_proximity": "48.8"
    }"#;

    fn report() -> Report {
        Report {
            report_type: "Geotechnical Investigation".to_string(),
            executive_summary: "Site suitable for residential use.".to_string(),
            site_description: "Gentle slope near Lake Washington.".to_string(),
            methodology: "Borings to 5 m.".to_string(),
            findings: "Glacial till below 0.6 m.".to_string(),
            recommendations: "Spread footings on till.".to_string(),
        }
    }

    #[test]
    fn test_parse_full_summary() {
        let summary = DocumentSummary::parse(FULL).unwrap();
        assert_eq!(summary.soil_profile.len(), 2);
        assert_eq!(summary.soil_profile[1].strength, Some(200.0));
        assert_eq!(summary.test_results.get("bearing_capacity"), Some(&150.0));
        assert_eq!(summary.lake_proximity, Some(48.8));
        assert!(summary.groundwater_depth.is_none());
        assert_eq!(summary.hazards.as_ref().and_then(|h| h.slide.clone()), None);
    }

    #[test]
    fn test_summary_missing_collections_default_empty() {
        let text = r#"{"doc_type": "Letter", "project_info": {"location": "Mercer Island"}, "confidence": "Low"}"#;
        let summary = DocumentSummary::parse(text).unwrap();
        assert!(summary.soil_profile.is_empty());
        assert!(summary.test_results.is_empty());
        assert!(summary.project_info.client.is_none());
        assert!(summary.recommendations.is_none());
        assert!(summary.hazards.is_none());
    }

    #[test]
    fn test_summary_missing_required_field_fails() {
        let text = r#"{"doc_type": "Letter", "project_info": {"location": "X"}}"#;
        let err = DocumentSummary::parse(text).unwrap_err();
        assert_eq!(err.schema, "DocumentSummary");
        assert!(err.message.contains("confidence"));

        let text = r#"{"doc_type": "Letter", "project_info": {"client": "X"}, "confidence": "Low"}"#;
        assert!(DocumentSummary::parse(text).is_err());
    }

    #[test]
    fn test_summary_non_numeric_fails() {
        let text = r#"{"doc_type": "Letter", "project_info": {"location": "X"}, "confidence": "Low", "slope_angle": "steep"}"#;
        assert!(DocumentSummary::parse(text).is_err());
    }

    #[test]
    fn test_summary_encode_parse_round_trip() {
        let summary = DocumentSummary::parse(FULL).unwrap();
        let encoded = summary.encode().unwrap();
        assert!(encoded.contains("\"groundwater_depth\":null"));
        assert_eq!(DocumentSummary::parse(&encoded).unwrap(), summary);
    }

    fn assert_round_trips(summary: &DocumentSummary) {
        let encoded = summary.encode().unwrap();
        assert_eq!(&DocumentSummary::parse(&encoded).unwrap(), summary, "{encoded}");
    }

    #[test]
    fn test_minimal_summary_round_trip() {
        let summary = DocumentSummary {
            doc_type: "Letter".to_string(),
            project_info: ProjectInfo {
                location: "Mercer Island".to_string(),
                client: None,
                date: None,
            },
            soil_profile: Vec::new(),
            groundwater_depth: None,
            test_results: BTreeMap::new(),
            confidence: "Low".to_string(),
            recommendations: None,
            hazards: None,
            slope_angle: None,
            lake_proximity: None,
        };
        assert_round_trips(&summary);

        let encoded = summary.encode().unwrap();
        assert!(encoded.contains("\"hazards\":null"));
        assert!(encoded.contains("\"soil_profile\":[]"));
    }

    #[test]
    fn test_populated_summary_round_trip() {
        let summary = DocumentSummary {
            doc_type: "Boring Log".to_string(),
            project_info: ProjectInfo {
                location: "Kelowna, BC".to_string(),
                client: Some("City of Kelowna".to_string()),
                date: Some("2023-06-01".to_string()),
            },
            soil_profile: vec![
                SoilLayer {
                    depth_start: 0.0,
                    depth_end: 1.25,
                    soil_type: "Silty sand".to_string(),
                    strength: None,
                },
                SoilLayer {
                    depth_start: 1.25,
                    depth_end: 7.5,
                    soil_type: "Clay".to_string(),
                    strength: Some(42.5),
                },
            ],
            groundwater_depth: Some(3.2),
            test_results: BTreeMap::from([
                ("bearing_capacity".to_string(), 150.0),
                ("cohesion".to_string(), -0.5),
            ]),
            confidence: "Medium".to_string(),
            recommendations: Some(vec!["Drain the slope".to_string()]),
            hazards: Some(HazardInfo {
                erosion: Some("Yes".to_string()),
                ..HazardInfo::default()
            }),
            slope_angle: Some(1e-3),
            lake_proximity: Some(1.0e6),
        };
        assert_round_trips(&summary);
    }

    #[test]
    fn test_summary_null_collections_are_empty() {
        let text = r#"{"doc_type": "Letter", "project_info": {"location": "X"}, "soil_profile": null, "test_results": null, "confidence": "Low"}"#;
        let summary = DocumentSummary::parse(text).unwrap();
        assert!(summary.soil_profile.is_empty());
        assert!(summary.test_results.is_empty());
        assert_round_trips(&summary);
    }

    #[test]
    fn test_summary_rejects_non_finite_numbers() {
        let cases = [
            r#""slope_angle": "NaN""#,
            r#""groundwater_depth": "inf""#,
            r#""test_results": {"bearing_capacity": "infinity"}"#,
            r#""soil_profile": [{"depth_start": "-inf", "depth_end": 1, "soil_type": "Fill"}]"#,
        ];
        for field in cases {
            let text = format!(
                r#"{{"doc_type": "Letter", "project_info": {{"location": "X"}}, "confidence": "Low", {field}}}"#
            );
            let err = DocumentSummary::parse(&text).unwrap_err();
            assert_eq!(err.schema, "DocumentSummary", "{field}");
        }
    }

    #[test]
    fn test_report_round_trip_and_missing_field() {
        let r = report();
        assert_eq!(Report::parse(&r.encode().unwrap()).unwrap(), r);

        let err = Report::parse(r#"{"report_type": "x"}"#).unwrap_err();
        assert_eq!(err.schema, "Report");
    }

    #[test]
    fn test_parse_after_clean_matches_plain() {
        let fenced = format!("```json\n{FULL}\n```");
        assert_eq!(
            DocumentSummary::parse(&clean(&fenced)).unwrap(),
            DocumentSummary::parse(FULL).unwrap()
        );
    }

    #[test]
    fn test_summary_display() {
        let summary = DocumentSummary::parse(FULL).unwrap();
        let text = summary.to_string();
        assert!(text.contains("Client: Robert Schwartz"));
        assert!(text.contains("- Depth 0-0.6m: Fill, Strength: Not Provided kPa"));
        assert!(text.contains("**Groundwater Depth:** Not Provided m"));
        assert!(text.contains("- bearing_capacity: 150"));
        assert!(text.contains("- Slide: Not Provided"));
        assert!(text.contains("**Slope Angle:** 15°"));
        assert!(text.ends_with("- Use spread footings"));

        let sparse = DocumentSummary::parse(
            r#"{"doc_type": "Letter", "project_info": {"location": "X"}, "confidence": "Low"}"#,
        )
        .unwrap();
        let text = sparse.to_string();
        assert!(text.contains("Client: Unknown, Date: Unknown"));
        assert!(text.contains("**Soil Profile:**\n(No data available)"));
        assert!(!text.contains("**Hazards:**"));
    }

    #[test]
    fn test_report_display() {
        let text = report().to_string();
        assert!(text.starts_with("# Geotechnical Investigation"));
        assert!(text.contains("## Findings\nGlacial till below 0.6 m."));
    }
}
