/// Instruction block for prescription analysis. The OCR text is appended
/// between `---` delimiters by [`build_analysis_prompt`].
pub const ANALYSIS_INSTRUCTIONS: &str = r#"Analyze the following prescription text extracted by OCR. Your task is to act as a medical information AI and return a well-structured JSON object. Do not include any explanatory text or markdown formatting around the JSON.

The JSON object must have the following structure:
{
  "summary": "A brief, one-to-two sentence summary of the prescription's purpose. For example: 'This prescription is for managing hypertension and high cholesterol.'",
  "medicines": [
    {
      "name": "The full name of the medication.",
      "type": "The class or type of medication (e.g., 'Beta-blocker', 'Statin').",
      "description": "A concise, easy-to-understand explanation of what the medication does.",
      "dosage": "The prescribed dosage (e.g., '50mg', '1 tablet').",
      "frequency": "How often the medication should be taken (e.g., 'Once daily', 'Twice daily with meals').",
      "sideEffects": ["A list of 3-5 common potential side effects.", "List each as a separate string."],
      "warnings": ["A list of 2-3 important warnings or contraindications.", "List each as a separate string."],
      "interactions": ["A list of 2-3 notable drug or food interactions.", "List each as a separate string."]
    }
  ],
  "overallRiskLevel": "Assess the overall potential for interactions and side effects from the combination of medicines. Categorize as 'Low', 'Moderate', or 'High'.",
  "recommendations": [
    "Provide 3-5 key recommendations for the patient. These should be actionable and easy to understand.",
    "Examples: 'Always take this medication with food to reduce stomach upset.' or 'Avoid grapefruit juice while taking this medication.'",
    "List each recommendation as a separate string."
  ]
}

Here is the prescription text to analyze:"#;

pub fn build_analysis_prompt(prescription_text: &str) -> String {
    format!("{ANALYSIS_INSTRUCTIONS}\n---\n{prescription_text}\n---\n")
}

/// Facts about one stored remedy, already defaulted for display.
#[derive(Debug, Clone)]
pub struct RemedyFacts<'a> {
    pub name: &'a str,
    pub ailment: &'a str,
    pub ingredients: &'a str,
    pub preparation: &'a str,
    pub dosage: &'a str,
    pub source: &'a str,
}

pub fn build_remedy_detail_prompt(facts: &RemedyFacts<'_>) -> String {
    format!(
        r#"You are a medical information assistant. Based on this natural remedy data, provide a structured, patient-friendly response in JSON format.

Remedy: "{name}"
Ailment: "{ailment}"
Ingredients: {ingredients}
Preparation: {preparation}
Dosage: {dosage}
Source: {source}

Please generate a comprehensive but concise JSON response. Focus on accuracy and safety. The response MUST be valid JSON only, no markdown formatting.

{{
  "description": "Clear, 1-2 sentence description of what this remedy is and how it works",
  "benefits": ["Benefit 1", "Benefit 2", "Benefit 3"],
  "usageInstructions": "Step-by-step instructions combining preparation and dosage",
  "potentialRisks": ["Risk 1", "Risk 2"],
  "scientificEvidence": "Brief summary of scientific support or traditional use"
}}"#,
        name = facts.name,
        ailment = facts.ailment,
        ingredients = facts.ingredients,
        preparation = facts.preparation,
        dosage = facts.dosage,
        source = facts.source,
    )
}

pub fn build_remedy_summary_prompt(conditions: &[String], top_remedies: &[&str]) -> String {
    format!(
        r#"Based on these natural remedies for "{conditions}": {remedies}.

Write a brief, professional 2-3 sentence summary that:
1. Acknowledges the search results
2. Mentions they are traditional/natural approaches
3. Emphasizes consulting healthcare providers

Keep it helpful but appropriately cautious."#,
        conditions = conditions.join(", "),
        remedies = top_remedies.join(", "),
    )
}
