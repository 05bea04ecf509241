//! Multi-section technical overview: why regulatory documents benefit from
//! package management, Maven and Nexus primers, and the system design.

use chrono::NaiveDate;

use crate::content::{Document, DocumentBuilder, TableData, TableRules, VAlign};
use crate::error::Result;
use crate::geometry::{PageGeometry, CM};
use crate::theme::{Palette, StyleName, Theme};

pub const TITLE: &str = "Regulatory Package Management: Technical Overview";

/// A4 with 2 cm side margins and 2.5 cm top and bottom.
pub fn geometry() -> PageGeometry {
    PageGeometry::a4().with_margins(2.5 * CM, 2.0 * CM, 2.5 * CM, 2.0 * CM)
}

const POM: &str = "<project>
  <groupId>eu.regulation.emir</groupId>
  <artifactId>rts-2015-2205</artifactId>
  <version>2023.05.15</version>
  <dependencies>
    <dependency>
      <groupId>eu.regulation.emir</groupId>
      <artifactId>law-648-2012</artifactId>
      <version>2024.01.09</version>
    </dependency>
  </dependencies>
</project>";

const ARCHITECTURE: &str = "\
┌───────────────────────────────────────────────┐
│  Layer 3: Intelligence Services               │
│  (Obligation Extraction, CDE Mapping, Gap     │
│   Analysis, Impact Assessment)                │
├───────────────────────────────────────────────┤
│  Layer 2: Document Management & Workflow      │
│  (Git Workflow, Change Detection, Update      │
│   Monitor, MCP Server, API)                   │
├───────────────────────────────────────────────┤
│  Layer 1: Package Management (Nexus + Maven)  │
│  (Maven Coordinates, Nexus Repository,        │
│   Artifact Storage, Dependency Resolution)    │
└───────────────────────────────────────────────┘";

const CLIENT_USAGE: &str = "mvn dependency:get -Dartifact=eu.regulation:emir-bom:2024.11.0

# Downloads to ~/.m2/repository/eu/regulation/emir-bom/2024.11.0/
# Automatically fetches all dependencies listed in BOM";

/// Append `<b>title:</b> text` body paragraphs.
fn labelled(b: &mut DocumentBuilder, items: &[(&str, &str)]) {
    for (label, text) in items {
        b.paragraph(format!("<b>{label}:</b> {text}"));
    }
}

/// Build the overview; `date` fills the footer's month and year.
pub fn technical_overview(date: NaiveDate) -> Result<Document> {
    let theme = Theme::build(&Palette::technical());
    let comparison_rules =
        TableRules::from_theme(&theme, &[8.0 * CM, 8.0 * CM]).valign(VAlign::Top);
    let mut b = DocumentBuilder::new(TITLE, theme);

    b.spacer(1.0 * CM)
        .heading("Regulatory Package Management", StyleName::Title)
        .styled("Technical Overview", StyleName::Subtitle)
        .spacer(0.5 * CM)
        .styled(
            "Applying proven software dependency management to regulatory compliance",
            StyleName::Tagline,
        )
        .spacer(2.0 * CM);

    why_documents_as_code(&mut b, comparison_rules);
    b.page_break();
    maven(&mut b);
    b.page_break();
    nexus(&mut b);
    b.page_break();
    system_design(&mut b);
    b.page_break();
    conclusion(&mut b, date);

    b.build()
}

fn why_documents_as_code(b: &mut DocumentBuilder, comparison_rules: TableRules) {
    b.heading(
        "3. Why Treating Regulatory Documents as Code Enables 30 Years of Learned Benefits",
        StyleName::SectionHeading,
    )
    .heading(
        "The Software Dependency Problem (Solved in 1990s-2000s)",
        StyleName::SubsectionHeading,
    )
    .paragraph("Before package managers, software development faced identical problems:")
    .paragraph("<b>Pre-Maven/NPM/pip era:</b>")
    .bullets([
        "Developers manually downloaded library JAR files from project websites",
        "No standard way to declare \"I need library X version 2.3\"",
        "Dependency conflicts: Library A needs XML parser v1.0, Library B needs v2.0",
        "No automated verification: \"Did I get the correct file from a trusted source?\"",
        "\"Works on my machine\" syndrome: Different developers had different library versions",
    ])
    .spacer(0.2 * CM)
    .paragraph("<b>Post-package manager:</b>")
    .bullets([
        "Declare dependencies in manifest file (pom.xml, package.json, requirements.txt)",
        "Package manager resolves transitive dependencies automatically",
        "Checksums verify integrity",
        "Version ranges allow compatible updates: \"any 2.x version\"",
        "Reproducible builds: Same inputs produce identical outputs",
    ])
    .spacer(0.3 * CM)
    .heading("Direct Parallels to Regulatory Documents", StyleName::SubsectionHeading)
    .table(
        TableData::new([
            ["Software Development", "Regulatory Compliance"],
            ["Library JAR file", "Regulation PDF/XSD"],
            ["Library version (e.g., 2.3.1)", "Consolidated version date (e.g., 2024.01.09)"],
            ["Dependency: \"Needs library X\"", "Dependency: \"RTS implements Article 9\""],
            ["Transitive dependencies", "Schema needs RTS needs base law"],
            ["SHA-256 checksum", "(Currently absent)"],
            ["Maven Central repository", "(Currently absent - our proposal)"],
            ["pom.xml dependency declaration", "(Currently manual)"],
            ["mvn install downloads all files", "(Currently manual downloads)"],
            ["Version conflict detection", "(Currently undetected)"],
        ]),
        comparison_rules,
    )
    .spacer(0.3 * CM)
    .heading("Lessons from 30 Years of Package Management", StyleName::SubsectionHeading);

    let lessons = [
        (
            "Lesson 1: Namespacing Prevents Collisions",
            "Structured coordinates like <font face='Courier' size='8'>eu.regulation.emir:law-648-2012:article-9</font> \
             are unambiguous, unlike \"Article 9\" which could refer to EMIR, MiFIR, or SFTR.",
        ),
        (
            "Lesson 2: Semantic Versioning Communicates Intent",
            "Hybrid approach combines date-based versioning for law (2024.01.09) with semantic versioning for \
             technical artifacts (schemas-3.0-mar2023) to indicate breaking changes.",
        ),
        (
            "Lesson 3: Dependency Resolution Prevents Conflicts",
            "Dependency graphs ensure RTS, schemas, and validation rules are compatible versions, preventing undefined behavior.",
        ),
        (
            "Lesson 4: Checksums Ensure Integrity",
            "SHA-256 hashes verify document authenticity and detect corruption or tampering.",
        ),
        (
            "Lesson 5: Bill of Materials (BOM) Manages Complexity",
            "One BOM request (<font face='Courier' size='8'>emir-bom:2024.11.0</font>) retrieves complete tested \
             package: law + RTS + ITS + schemas + validation rules.",
        ),
        (
            "Lesson 6: Reproducibility Enables Auditability",
            "pom.xml from Q2 2023 provides complete specification of exact regulatory versions used, enabling audit reproduction.",
        ),
    ];
    for (title, text) in lessons {
        b.heading(title, StyleName::MinorHeading).paragraph(text);
    }
}

fn maven(b: &mut DocumentBuilder) {
    b.heading("4. Maven Explainer", StyleName::SectionHeading)
        .paragraph(
            "Apache Maven is a build automation and dependency management tool for Java projects, created in 2003. \
             While initially designed for software builds, its dependency management concepts are applicable to any \
             versioned artifacts.",
        )
        .heading("Core Concepts", StyleName::SubsectionHeading)
        .heading("Coordinates (GAV)", StyleName::MinorHeading)
        .paragraph(
            "Every artifact is uniquely identified by: \
             <font face='Courier' size='8'>groupId : artifactId : version</font>",
        )
        .paragraph(
            "Example (regulations): \
             <font face='Courier' size='8'>eu.regulation.emir : law-648-2012 : 2024.01.09</font>",
        )
        .heading("POM (Project Object Model)", StyleName::MinorHeading)
        .paragraph("XML file describing artifact and its dependencies:")
        .preformatted(POM, StyleName::Code)
        .heading("Dependency Resolution", StyleName::MinorHeading)
        .paragraph("When you declare a dependency, Maven:")
        .bullets([
            "Downloads the POM file",
            "Reads its dependencies",
            "Recursively downloads transitive dependencies",
            "Detects version conflicts",
            "Verifies checksums",
            "Stores in local cache (~/.m2/repository/)",
        ])
        .spacer(0.2 * CM)
        .heading("What Maven Provides", StyleName::MinorHeading)
        .bullets([
            "Standardized coordinates: Globally unique artifact identification",
            "Transitive dependency resolution: Automatically fetch what you need",
            "Checksum verification: Integrity guarantees",
            "Version management: Track available versions, identify latest",
            "Local caching: Download once, reuse across projects",
            "Mature tooling: 20+ years of ecosystem development",
        ])
        .spacer(0.2 * CM)
        .heading("What Maven Doesn't Provide", StyleName::MinorHeading)
        .bullets([
            "Content analysis: Doesn't understand PDFs or extract obligations",
            "Semantic understanding: No knowledge of regulatory relationships",
            "Change tracking: Doesn't detect what changed between versions",
            "Workflow: No approval process, check-in/check-out, branching",
            "Search: Basic artifact search only, not full-text content search",
        ]);
}

fn nexus(b: &mut DocumentBuilder) {
    b.heading("5. Nexus Repository Manager Explainer", StyleName::SectionHeading)
        .paragraph(
            "Sonatype Nexus Repository Manager is a repository server for storing and managing binary artifacts. \
             It acts as a central hub for Maven artifacts (and other package formats: npm, PyPI, Docker, etc.).",
        )
        .paragraph(
            "<b>Two editions:</b> Nexus Repository OSS (free, open-source) and Nexus Repository Pro (commercial).",
        )
        .heading("Core Functions", StyleName::SubsectionHeading);
    labelled(
        b,
        &[
            (
                "Artifact Storage",
                "Stores artifacts in Maven format with automatic checksum generation (SHA-256, SHA-1, MD5) and metadata management.",
            ),
            (
                "Repository Types",
                "Hosted (your artifacts), Proxy (cache from remote), Group (combine multiple repositories).",
            ),
            (
                "Access Control",
                "Role-based access control (RBAC): anonymous read for public, authentication for premium, deploy permissions controlled.",
            ),
            ("REST API", "Programmatic access for searching, uploading, and managing artifacts."),
            (
                "Web UI",
                "Browser-based interface for browsing, searching, downloading, and viewing dependencies.",
            ),
        ],
    );

    b.heading("Infrastructure Requirements", StyleName::SubsectionHeading)
        .paragraph("<b>Nexus Repository OSS:</b>")
        .bullets([
            "Cost: Free (open-source, Eclipse Public License)",
            "Server: 4-8 CPU cores, 8-16GB RAM recommended for production",
            "Storage: 1-10GB per regulatory regime (all versions)",
            "Deployment: Docker container, cloud-native (AWS, Azure, GCP)",
        ])
        .paragraph(
            "<b>Typical setup:</b> AWS EC2 t3.large (~$60/month) + 1TB EBS storage (~$100/month) + data transfer = $200-500/month.",
        )
        .heading("What Nexus Doesn't Provide", StyleName::MinorHeading)
        .bullets([
            "Git workflow: No branching, pull requests, or code review",
            "Document processing: Doesn't parse PDFs or extract content",
            "Analysis: No understanding of regulatory semantics",
            "Notifications: Basic webhooks only, not \"alert when EMIR updated\"",
            "Gap analysis: No concept of entity profile or compliance requirements",
        ]);
}

fn system_design(b: &mut DocumentBuilder) {
    b.heading(
        "6. NYQST Regulatory Package Manager: System Design",
        StyleName::SectionHeading,
    )
    .heading("Architecture Overview", StyleName::SubsectionHeading)
    .paragraph("NYQST builds three layers on top of Nexus + Maven:")
    .preformatted(ARCHITECTURE, StyleName::Diagram)
    .heading("Layer 1: Package Management Foundation", StyleName::SubsectionHeading)
    .paragraph("<b>Uses Maven + Nexus as-is</b>, applying their patterns to regulatory documents.")
    .paragraph(
        "<b>Artifact types:</b> Laws/Regulations (PDFs), Technical Standards (RTS/ITS), Schemas (XSD in ZIP), \
         Validation Rules (Excel), BOMs (POM-only).",
    )
    .paragraph("<b>Repository structure:</b>")
    .bullets([
        "Public hosted repository: Freely available regulatory documents (anonymous read)",
        "Premium hosted repository: Analyzed documents (authenticated access, billing integration)",
    ])
    .paragraph("<b>Client usage:</b>")
    .preformatted(CLIENT_USAGE, StyleName::Code)
    .heading("Layer 2: Document Management &amp; Workflow", StyleName::SubsectionHeading)
    .paragraph("<b>Git integration</b> for document lifecycle:")
    .bullets([
        "Check-in: Team member adds new regulatory document to Git",
        "Pull request: Changes reviewed by compliance team",
        "Approval: Legal sign-off required before merge",
        "CI/CD pipeline: Validates POM, computes checksums, runs quality checks, deploys to Nexus",
        "Git tag: Release tagged (e.g., emir-bom-2024.11.0)",
    ])
    .paragraph(
        "<b>Change detection:</b> Monitor regulator websites (EUR-Lex, FCA), compare checksums, \
         generate change reports, notify subscribers.",
    )
    .paragraph(
        "<b>MCP Server:</b> LLM agents can query regulatory repository, retrieve obligations, \
         analyze changes between versions.",
    )
    .heading("Layer 3: Intelligence Services", StyleName::SubsectionHeading)
    .paragraph(
        "<b>This layer is where NYQST adds commercial value</b> beyond free document hosting.",
    );
    labelled(
        b,
        &[
            (
                "Document Ingestion &amp; Parsing",
                "PDF text extraction (pdfplumber), OCR (Tesseract), structure identification (articles, sections), \
                 metadata enrichment (CELEX numbers, effective dates).",
            ),
            (
                "Obligation Extraction",
                "Identify normative language (\"shall\", \"must\"), parse components (actor, action, object, recipient, \
                 timing, conditions), publish as Maven artifact with dependency on source document.",
            ),
            (
                "CDE Mapping",
                "Map regulatory fields to CPMI-IOSCO Critical Data Elements, indicate harmonization across regimes \
                 (EMIR, MiFIR, SFTR, CFTC, etc.).",
            ),
            (
                "ISO 20022 Integration",
                "Link regulatory fields to ISO 20022 message elements (message name, XPath, data type, occurrence).",
            ),
            (
                "Gap Analysis",
                "Input entity profile (jurisdiction, activities, products), query canonical model, compute gaps \
                 (required - installed), prioritize (critical, recommended, optional).",
            ),
        ],
    );

    b.heading("Technology Stack", StyleName::SubsectionHeading);
    labelled(
        b,
        &[
            ("Core", "Nexus OSS, Maven, Git, PostgreSQL"),
            ("Analysis", "Python, Neo4j (graph DB), PyPDF2/pdfplumber, spaCy/NLTK"),
            ("Integration", "FastAPI, MCP Server, Webhooks"),
            ("Clients", "Maven CLI, custom CLI (nyqst-reg), web dashboard"),
        ],
    );

    b.heading("Access Tiers", StyleName::SubsectionHeading);
    labelled(
        b,
        &[
            (
                "Public (Free)",
                "Raw regulatory documents from public sources, basic Maven repository, version tracking, checksums.",
            ),
            (
                "Premium (Subscription)",
                "Public + structured obligations + CDE mappings + ISO 20022 links, API access, gap analysis, \
                 update notifications.",
            ),
            (
                "Enterprise (Custom)",
                "Premium + client-specific analysis + custom BOMs, dedicated support, custom integrations, priority updates.",
            ),
        ],
    );
}

fn conclusion(b: &mut DocumentBuilder, date: NaiveDate) {
    b.heading("Conclusion", StyleName::SectionHeading)
        .paragraph(
            "The software development industry solved library dependency management 20+ years ago through package \
             managers like Maven and repository servers like Nexus.",
        )
        .spacer(0.2 * CM)
        .paragraph("NYQST Regulatory Package Manager applies these proven patterns to regulatory compliance:")
        .bullets([
            "<b>Maven</b> provides standardized coordinates, dependency resolution, and version management",
            "<b>Nexus</b> provides centralized storage, access control, and APIs",
            "<b>Git + workflows</b> add approval processes and change tracking",
            "<b>Analysis services</b> extract structured obligations, map to CDEs and ISO 20022, and enable gap analysis",
        ])
        .spacer(0.3 * CM)
        .paragraph(
            "The foundation (Layer 1) uses open-source tools with zero licensing cost. The value-add (Layer 3) is where \
             commercial services differentiate. The result is a system that provides single-version-of-truth, automated \
             dependency resolution, integrity verification, and auditability\u{2014}benefits that the software industry \
             has relied upon for decades, now applied to regulatory compliance.",
        )
        .spacer(1.0 * CM)
        .styled(
            format!(
                "NYQST Regulatory Intelligence Platform | Document Version 1.0 | {}",
                date.format("%B %Y")
            ),
            StyleName::Footer,
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentBlock;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 18).unwrap()
    }

    #[test]
    fn four_sections_separated_by_breaks() {
        let doc = technical_overview(date()).unwrap();
        assert_eq!(doc.page_breaks(), 4);
        let sections: Vec<&str> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Heading {
                    text,
                    style: StyleName::SectionHeading,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(sections.len(), 5);
        assert!(sections[0].starts_with("3. "));
        assert_eq!(sections[4], "Conclusion");
    }

    #[test]
    fn footer_carries_month_and_year() {
        let doc = technical_overview(date()).unwrap();
        match doc.blocks.last() {
            Some(ContentBlock::Paragraph { text, style }) => {
                assert_eq!(*style, StyleName::Footer);
                assert!(text.ends_with("| November 2024"), "{text}");
            }
            other => panic!("unexpected last block {other:?}"),
        }
    }

    #[test]
    fn code_listings_stay_verbatim() {
        let doc = technical_overview(date()).unwrap();
        let listings: Vec<_> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Preformatted { text, style } => Some((text.as_str(), *style)),
                _ => None,
            })
            .collect();
        assert_eq!(listings.len(), 3);
        assert!(listings[0].0.starts_with("<project>\n  <groupId>"));
        assert_eq!(listings[1].1, StyleName::Diagram);
        assert_eq!(listings[1].0.lines().count(), 13);
    }
}
