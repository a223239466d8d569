//! Prompt construction.
//!
//! Every prompt is a fixed instruction block followed by the caller's data,
//! inserted verbatim. Nothing here truncates: a long chat history produces a
//! long prompt.

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "Mercer Island, WA";

const ANALYSIS_SCHEMA: &str = r#"{
  "doc_type": str,  // e.g., "Feasibility Report"
  "project_info": {
    "location": str,  // Full address if available, e.g., "8807 SE 55th Pl, Mercer Island, WA 98040"
    "client": str or null,  // Client name, or null if not specified
    "date": str or null  // Report date, or null if not specified
  },
  "soil_profile": [
    {
      "depth_start": float,  // Start depth in meters
      "depth_end": float,    // End depth in meters
      "soil_type": str,      // Soil classification (e.g., "Clay")
      "strength": float or null  // Shear strength in kPa, or null if not provided
    }
  ],
  "groundwater_depth": float or null,  // Depth in meters, or null if not specified
  "test_results": {str: float},  // e.g., {"bearing_capacity": 150.0}, empty object if not specified
  "confidence": str,  // "High", "Medium", or "Low" with a brief reason
  "recommendations": [str] or null,  // List of recommendations, or null if not specified
  "hazards": {
    "erosion": str or null,  // Erosion hazard status, e.g., "Not Present"
    "slide": str or null,    // Slide hazard status
    "seismic": str or null,  // Seismic hazard status
    "steep_slope": str or null,  // Steep slope hazard status
    "watercourse_buffer": str or null  // Watercourse buffer status
  } or null,
  "slope_angle": float or null,  // Slope angle in degrees, e.g., 0.00
  "lake_proximity": float or null  // Distance to lake in meters, e.g., 763.7
}"#;

const ANALYSIS_EXAMPLE: &str = r#"{"doc_type": "Feasibility Report", "project_info": {"location": "8807 SE 55th Pl, Mercer Island, WA 98040", "client": null, "date": null}, "soil_profile": [], "groundwater_depth": null, "test_results": {}, "confidence": "Medium - missing geotechnical data but hazard analysis and recommendations provided", "recommendations": ["Conduct shallow borings to confirm soil type", "Verify soil bearing capacity with CPT"], "hazards": {"erosion": "Not Present", "slide": "Not Present", "seismic": "Not Present", "steep_slope": "Not Present", "watercourse_buffer": "Not Present"}, "slope_angle": 0.00, "lake_proximity": 763.7}"#;

const REPORT_SCHEMA: &str = r#"{
  "report_type": str,  // e.g., "Site Investigation"
  "executive_summary": str,  // Summary of findings
  "site_description": str,  // Site details
  "methodology": str,  // Investigation methods
  "findings": str,  // Detailed findings
  "recommendations": str  // Engineering recommendations
}"#;

const JSON_ONLY: &str = "Return ONLY the JSON object as a single string, with no additional text, comments, Markdown (no ```json or ``` fences) or any formatting outside the JSON structure.";

/// Renders the three prompt families.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    region: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl PromptBuilder {
    /// Create a builder framing the engineer in `region`.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Configured region label.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Expert chat prompt: instructions, then the history, then the query.
    pub fn chat_prompt(&self, query: &str, chat_history: &str) -> String {
        let region = &self.region;
        let mut prompt = format!(
            "You are an expert geotechnical engineer specializing in the Pacific Northwest, particularly {region}.
Focus on soil mechanics, foundation design, slope stability, and ground improvement.

Guidelines:
1. Prioritize safety and the governing standards (ASCE, IBC, Washington State codes).
2. Reflect Pacific Northwest geology, including glacial till and seismic risk.
3. Provide actionable, practical advice.
4. If you are uncertain or the data is insufficient, say 'I cannot provide a definitive answer without site-specific data.'
5. For numerical answers, give ranges (e.g., cohesion 20-30 kPa) and justify them with context.

Example: 'For glacial till in {region}, bearing capacity typically ranges from 150-200 kPa, but confirm with site tests.'
"
        );
        prompt.push_str("\nChat History:\n");
        prompt.push_str(chat_history);
        prompt.push_str("\nQuery: ");
        prompt.push_str(query);
        prompt
    }

    /// Document analysis prompt; ends with `Document Content:\n` plus the text.
    pub fn analysis_prompt(&self, document_text: &str) -> String {
        let mut prompt = format!(
            "You are an expert geotechnical document analyzer. Analyze the geotechnical document content below and extract structured data. Return the result as a valid JSON object matching this schema:

{ANALYSIS_SCHEMA}

Guidelines:
- Extract exact values with units where possible, converting to meters and kPa.
- For soil layers, parse depths and types; set \"strength\" to null when it is not given.
- If data is missing or unclear, use null and note it in \"confidence\" (e.g., \"Low - missing groundwater data\").
- Extract recommendations as a list of strings when present (e.g., [\"Conduct shallow borings\", \"Verify soil bearing capacity\"]).
- Extract hazard information (erosion, slide, seismic, steep slope, watercourse buffer) when present.
- Extract the slope angle in degrees and the lake proximity in meters when specified.
- For the location, remove redundant repeated parts (if \"{region}\" appears twice, include it only once).
- Weigh hazard analysis, slope data, lake proximity and recommendations when assessing confidence, not just geotechnical data.
- {JSON_ONLY}

Example Output:
{ANALYSIS_EXAMPLE}

",
            region = self.region,
        );
        prompt.push_str("Document Content:\n");
        prompt.push_str(document_text);
        prompt
    }

    /// Report generation prompt. A missing document list renders as `None`.
    pub fn report_prompt(
        &self,
        report_type: &str,
        project_info: &str,
        parameters: &str,
        referenced_documents: Option<&str>,
    ) -> String {
        let region = &self.region;
        let documents = referenced_documents.unwrap_or("None");
        format!(
            "You are an expert geotechnical engineer. Generate a '{report_type}' geotechnical report for {region}, following ASCE and Washington State standards. Return the result as a valid JSON object matching this schema:

{REPORT_SCHEMA}

Inputs:
Project Info: {project_info}
Parameters: {parameters}
Documents: {documents}

Guidelines:
- Use technical language but keep it clear.
- Include seismic and glacial till considerations for {region}.
- If data is insufficient, note the limitations in the relevant section.
- {JSON_ONLY}

Example Output:
{{\"report_type\": \"Site Investigation\", \"executive_summary\": \"The site shows stable clay layers.\", \"site_description\": \"Located in {region}.\", \"methodology\": \"Borehole sampling.\", \"findings\": \"Clay to 2m, sand below.\", \"recommendations\": \"Use shallow foundations.\"}}
"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt_layout() {
        let prompts = PromptBuilder::default();
        let prompt = prompts.chat_prompt(
            "What is the bearing capacity of glacial till?",
            "User: hi\nAssistant: hello",
        );
        assert!(prompt.contains("Mercer Island, WA"));
        assert!(prompt.contains("glacial till"));
        assert!(prompt.ends_with(
            "\nChat History:\nUser: hi\nAssistant: hello\nQuery: What is the bearing capacity of glacial till?"
        ));
    }

    #[test]
    fn test_chat_prompt_empty_history() {
        let prompt = PromptBuilder::default().chat_prompt("q", "");
        assert!(prompt.ends_with("\nChat History:\n\nQuery: q"));
    }

    #[test]
    fn test_analysis_prompt() {
        let prompts = PromptBuilder::default();
        let empty = prompts.analysis_prompt("");
        assert!(!empty.is_empty());
        assert!(empty.ends_with("Document Content:\n"));
        assert!(empty.contains("\"lake_proximity\""));
        assert!(empty.contains("remove redundant repeated parts"));
        assert!(empty.contains("Return ONLY the JSON object"));

        let full = prompts.analysis_prompt("Boring B-1: glacial till at 2 m");
        assert!(full.ends_with("Document Content:\nBoring B-1: glacial till at 2 m"));
    }

    #[test]
    fn test_report_prompt_substitution() {
        let prompts = PromptBuilder::new("Bellevue, WA");
        let prompt = prompts.report_prompt(
            "Site Investigation",
            "123 Main St",
            "cohesion: 25",
            None,
        );
        assert!(prompt.contains("Generate a 'Site Investigation' geotechnical report for Bellevue, WA"));
        assert!(prompt.contains("Project Info: 123 Main St\n"));
        assert!(prompt.contains("Parameters: cohesion: 25\n"));
        assert!(prompt.contains("Documents: None\n"));
        assert!(prompt.contains("\"report_type\": str"));

        let prompt = prompts.report_prompt("Feasibility", "x", "y", Some("{\"doc_type\":\"A\"}"));
        assert!(prompt.contains("Documents: {\"doc_type\":\"A\"}\n"));
    }
}
