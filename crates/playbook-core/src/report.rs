//! # Assessment Report
//!
//! Markdown rendering of the assessment results, optionally branded with
//! the session vendor. Only a complete assessment can be reported.

use crate::PlaybookError;
use crate::assessment::{AssessmentBank, AssessmentSummary};
use crate::dates::format_date;
use crate::maturity::MaturityLevel;
use crate::vendor::VendorConfig;
use std::fmt::Write;
use time::Date;

/// Inputs of one report.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub summary: &'a AssessmentSummary,
    pub bank: &'a AssessmentBank,
    pub maturity: Option<MaturityLevel>,
    pub vendor: Option<&'a VendorConfig>,
    pub generated: Date,
}

fn fmt_error(e: std::fmt::Error) -> PlaybookError {
    PlaybookError::SerializationError(e.to_string())
}

/// Render the report as Markdown.
pub fn render_markdown(ctx: &ReportContext<'_>) -> Result<String, PlaybookError> {
    let summary = ctx.summary;
    if !summary.complete {
        return Err(PlaybookError::InvalidInput(
            "Assessment is not complete".to_string(),
        ));
    }

    let mut out = String::new();
    writeln!(out, "# P29 Readiness Assessment").map_err(fmt_error)?;
    if let Some(vendor) = ctx.vendor {
        writeln!(out, "\n_Prepared with {}_", vendor.name).map_err(fmt_error)?;
    }
    writeln!(out, "\nGenerated: {}", format_date(ctx.generated)?).map_err(fmt_error)?;

    writeln!(out, "\n## Overall result\n").map_err(fmt_error)?;
    writeln!(
        out,
        "- Score: {} / {} ({}%)",
        summary.total, summary.max, summary.percentage
    )
    .map_err(fmt_error)?;
    writeln!(out, "- Readiness: {}", summary.band).map_err(fmt_error)?;
    if let Some(level) = ctx.maturity {
        writeln!(out, "- Maturity: {}", level).map_err(fmt_error)?;
    }
    writeln!(out, "\n{}", summary.band.recommendation()).map_err(fmt_error)?;

    writeln!(out, "\n## Domains\n").map_err(fmt_error)?;
    writeln!(out, "| Domain | Score | % |").map_err(fmt_error)?;
    writeln!(out, "|--------|-------|---|").map_err(fmt_error)?;
    for domain in &summary.domains {
        let name = ctx
            .bank
            .domains()
            .iter()
            .find(|d| d.id == domain.domain)
            .map(|d| d.name.as_str())
            .unwrap_or(domain.domain.as_str());
        writeln!(
            out,
            "| {} | {} / {} | {} |",
            name,
            domain.score,
            domain.max,
            domain.percentage()
        )
        .map_err(fmt_error)?;
    }

    if let Some(level) = ctx.maturity {
        writeln!(out, "\n## Next steps\n").map_err(fmt_error)?;
        writeln!(out, "{}", level.recommendation()).map_err(fmt_error)?;
        writeln!(
            out,
            "\nRecommended start: phase {} on a {}-month track.",
            level.starting_phase(),
            level.track_months()
        )
        .map_err(fmt_error)?;
    }

    if let Some(email) = ctx.vendor.and_then(|v| v.contact_email.as_deref()) {
        writeln!(out, "\nContact: {}", email).map_err(fmt_error)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{AssessmentDomain, DomainScore, ReadinessBand};
    use time::macros::date;

    fn summary(complete: bool) -> AssessmentSummary {
        AssessmentSummary {
            total: 90,
            max: 120,
            percentage: 75,
            band: ReadinessBand::Established,
            complete,
            domains: vec![DomainScore {
                domain: "governance".to_string(),
                score: 30,
                answered: 10,
                max: 40,
            }],
        }
    }

    fn bank() -> AssessmentBank {
        AssessmentBank::new(vec![AssessmentDomain {
            id: "governance".to_string(),
            name: "Governance".to_string(),
            description: String::new(),
            questions: Vec::new(),
        }])
    }

    #[test]
    fn incomplete_assessment_rejected() {
        let summary = summary(false);
        let bank = bank();
        let ctx = ReportContext {
            summary: &summary,
            bank: &bank,
            maturity: None,
            vendor: None,
            generated: date!(2026 - 10 - 19),
        };
        assert!(render_markdown(&ctx).is_err());
    }

    #[test]
    fn report_contains_scores_and_domains() {
        let summary = summary(true);
        let bank = bank();
        let ctx = ReportContext {
            summary: &summary,
            bank: &bank,
            maturity: Some(MaturityLevel::Level2),
            vendor: None,
            generated: date!(2026 - 10 - 19),
        };
        let report = render_markdown(&ctx).expect("render");

        assert!(report.contains("Score: 90 / 120 (75%)"));
        assert!(report.contains("Readiness: Established"));
        assert!(report.contains("| Governance | 30 / 40 | 75 |"));
        assert!(report.contains("Generated: 2026-10-19"));
        assert!(report.contains("Maturity: Level 2"));
    }
}
