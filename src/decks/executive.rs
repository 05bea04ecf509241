//! Two-page executive summary of the regulatory package manager.

use crate::content::{Document, DocumentBuilder, TableData, TableRules, VAlign};
use crate::error::Result;
use crate::geometry::{PageGeometry, CM};
use crate::style::{Color, TextAlign};
use crate::theme::{Palette, StyleName, Theme};

pub const TITLE: &str = "Regulatory Package Manager: Executive Summary";

/// A4 with 2 cm margins.
pub fn geometry() -> PageGeometry {
    PageGeometry::a4().uniform(2.0 * CM)
}

fn widths(cm: &[f32]) -> Vec<f32> {
    cm.iter().map(|w| w * CM).collect()
}

pub fn executive_summary() -> Result<Document> {
    let theme = Theme::build(&Palette::executive());
    let rules = |cm: &[f32]| TableRules::from_theme(&theme, &widths(cm));
    let tier_rules = rules(&[2.5, 5.0, 3.0, 3.0]).body_background(Color::rgb8(0xf5, 0xf5, 0xdc));
    let revenue_rules = rules(&[2.0, 4.5, 4.5, 2.5]).align(TextAlign::Center);
    let timeline_rules = rules(&[2.0, 3.5, 8.0])
        .align(TextAlign::Center)
        .align_column(2, TextAlign::Left)
        .valign(VAlign::Top);
    let metrics_rules = rules(&[3.0, 6.5, 4.0]);

    let mut b = DocumentBuilder::new(TITLE, theme);

    b.heading(TITLE, StyleName::Title)
        .styled(
            "A Maven-based system for managing regulatory documents as versioned packages",
            StyleName::Subtitle,
        )
        .spacer(0.3 * CM);

    b.heading("The Problem", StyleName::SectionHeading)
        .paragraph(
            "Financial institutions struggle to maintain current regulatory documentation across multiple jurisdictions. \
             Current approaches involve manual document collection, no version control, difficulty tracking amendments, \
             impossible gap analysis, and each RegTech vendor re-analyzing the same regulations independently.",
        )
        .paragraph(
            "<b>Result:</b> High compliance costs, fragmented solutions, and risk of using outdated regulations.",
        )
        .spacer(0.2 * CM);

    b.heading("The Solution: Regulatory Package Manager", StyleName::SectionHeading)
        .paragraph(
            "Apply proven software package management patterns (Maven) to regulatory documents. \
             Each regulation becomes a versioned artifact with dependencies, checksums, and metadata.",
        )
        .spacer(0.2 * CM);

    b.heading("Core Innovation: Bill of Materials (BOM)", StyleName::SubsectionHeading)
        .paragraph(
            "A \"regime package\" (e.g., EMIR 2024.11.0) includes: Base law, Technical Standards (RTS, ITS), \
             Implementation artifacts (XML schemas, validation rules), with all dependencies automatically resolved.",
        )
        .paragraph(
            "<font name='Courier' size='7'>eu.regulation.emir:law-648-2012:2024.01.09:pdf</font><br/>\
             <font name='Courier' size='7'>eu.regulation:emir-bom:2024.11.0:pom</font>",
        )
        .spacer(0.2 * CM);

    b.heading("Key Capabilities", StyleName::SubsectionHeading)
        .paragraph(
            "<b>Document Management:</b> Version control, transitive dependency resolution, integrity checking (SHA-256), gap analysis.",
        )
        .paragraph(
            "<b>Analysis Services:</b> Obligation extraction, CDE mapping to CPMI-IOSCO standards, ISO 20022 integration, \
             cross-regime impact analysis.",
        )
        .paragraph(
            "<b>Integration:</b> MCP Server for LLM agents, REST API, CLI, Git workflow with PR approvals.",
        )
        .spacer(0.2 * CM);

    b.heading("Technical Architecture", StyleName::SectionHeading)
        .paragraph(
            "<b>5-Stage Pipeline:</b> (1) Document Ingestion (PDF parsing, OCR), \
             (2) Structural Analysis (article detection), (3) Semantic Extraction (obligations), \
             (4) Enrichment (CDE/ISO mapping), (5) Publication (Maven artifacts).",
        )
        .spacer(0.15 * CM);

    b.table(
        TableData::new([
            ["Tier", "Content", "Access", "Revenue"],
            ["Public", "Raw regulatory PDFs", "Free", "Lead generation"],
            ["Premium", "Structured obligations, CDE mappings", "Subscription", "Primary revenue"],
            ["Enterprise", "Client-specific analysis, custom BOMs", "Custom pricing", "High-margin"],
        ]),
        tier_rules,
    )
    .spacer(0.2 * CM);

    b.heading("Commercial Model", StyleName::SectionHeading).table(
        TableData::new([
            ["Year", "Premium Clients", "Enterprise Clients", "Total Revenue"],
            ["Year 1", "20 \u{d7} $30K = $600K", "2 \u{d7} $200K = $400K", "$1.0M"],
            ["Year 2", "100 \u{d7} $30K = $3.0M", "10 \u{d7} $200K = $2.0M", "$5.0M"],
            ["Year 3", "500 \u{d7} $30K = $15.0M", "25 \u{d7} $200K = $5.0M", "$20.0M"],
        ]),
        revenue_rules,
    )
    .spacer(0.2 * CM);

    b.heading("Investment Required", StyleName::SubsectionHeading)
        .paragraph(
            "<b>Development:</b> $216K (6 FTE \u{d7} 8 weeks \u{d7} $4.5K/week) - Backend engineers, data engineer, \
             regulatory analyst, frontend engineer, DevOps engineer.",
        )
        .paragraph(
            "<b>Infrastructure Year 1:</b> $0 (Nexus OSS, cloud-hosted Neo4j free tier, existing AWS)",
        )
        .paragraph(
            "<b>Total Initial Investment:</b> $216K for 8-week MVP | <b>ROI:</b> 4.6\u{d7} Year 1, 23\u{d7} Year 3",
        )
        .spacer(0.3 * CM);

    b.page_break();

    b.heading("Competitive Advantages", StyleName::SectionHeading)
        .paragraph(
            "<b>vs. Manual Management:</b> Automated updates, dependency awareness, systematic gap analysis.",
        )
        .paragraph(
            "<b>vs. Existing RegTech:</b> Open architecture, standard Maven tooling, composable services, \
             multi-tenant (analyze once, serve many).",
        )
        .paragraph(
            "<b>vs. Building In-House:</b> Network effects, continuous professional updates, pre-analyzed obligations.",
        )
        .spacer(0.2 * CM);

    b.heading("Implementation Timeline (8-Week MVP)", StyleName::SectionHeading)
        .table(
            TableData::new([
                ["Weeks", "Milestone", "Deliverables"],
                ["1-2", "Foundation", "Nexus setup, Maven coordinates, first BOM (EMIR)"],
                [
                    "3-4",
                    "Document Ingestion",
                    "PDF pipeline, metadata extraction, initial uploads (EMIR/MiFID/SFTR)",
                ],
                ["5-6", "Analysis Pipeline", "Obligation extraction, CDE mapping, Neo4j graph schema"],
                ["7-8", "Integration Layer", "MCP Server, REST API, CLI tool, dashboard prototype"],
                ["9+", "Production", "Security, auth, monitoring, customer onboarding"],
            ]),
            timeline_rules,
        )
        .spacer(0.2 * CM);

    b.heading("Success Metrics", StyleName::SectionHeading)
        .table(
            TableData::new([
                ["Category", "Metric", "Target"],
                ["Technical", "Document version accuracy", "99%"],
                ["Technical", "Dependency resolution time", "<5 minutes"],
                ["Technical", "Obligation extraction accuracy", "90%+"],
                ["Technical", "CDE mapping confidence", "95%+"],
                ["Business", "Design partners signed (6 months)", "20"],
                ["Business", "Paying customers (9 months)", "5"],
                ["Business", "ARR (12 months)", "$1M"],
                ["Business", "Gross margin", "50%+"],
            ]),
            metrics_rules,
        )
        .spacer(0.2 * CM);

    b.heading("Next Steps", StyleName::SectionHeading);
    for step in [
        "<b>1. Validate with design partners:</b> 5-10 target clients for feedback",
        "<b>2. Secure funding:</b> $216K for 8-week MVP development",
        "<b>3. Hire core team:</b> Regulatory analyst + 2 engineers to start",
        "<b>4. Build MVP:</b> EMIR + MiFID II regimes with basic analysis",
        "<b>5. Beta launch:</b> Q1 2025 with design partners",
        "<b>6. Commercial launch:</b> Q2 2025",
    ] {
        b.paragraph(step);
    }
    b.spacer(0.3 * CM);

    b.heading("Conclusion", StyleName::SectionHeading).paragraph(
        "The Regulatory Package Manager applies battle-tested software engineering practices (Maven, dependency management, \
         versioning) to solve a $10B+ market problem in RegTech. By treating regulations as versioned packages and building \
         reusable analysis on top, we can:",
    );
    for point in [
        "\u{2022} <b>Reduce compliance costs</b> by 60-80% through automation",
        "\u{2022} <b>Improve accuracy</b> through systematic version control",
        "\u{2022} <b>Enable new use cases</b> (gap analysis, impact assessment, automated monitoring)",
        "\u{2022} <b>Create network effects</b> through shared document repository",
        "\u{2022} <b>Build defensible moats</b> through accumulated analysis artifacts",
    ] {
        b.paragraph(point);
    }
    b.spacer(0.3 * CM);

    b.styled(
        "<b>Investment ask:</b> $216K for 8-week MVP<br/>\
         <b>Projected return:</b> $1M Year 1, $20M Year 3<br/>\
         <b>Time to first revenue:</b> 6 months",
        StyleName::Callout,
    )
    .spacer(0.2 * CM)
    .spacer(0.3 * CM)
    .styled("Date: November 18, 2024", StyleName::Footer);

    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentBlock;

    #[test]
    fn one_page_break_and_four_tables() {
        let doc = executive_summary().unwrap();
        assert_eq!(doc.page_breaks(), 1);
        let tables: Vec<_> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Table { data, .. } => Some(data),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 4);
        assert_eq!(tables[3].row_count(), 9);
        assert_eq!(tables[3].column_count(), 3);
    }
}
