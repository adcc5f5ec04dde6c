//! Expert-knowledge retrieval over curated series notes.
//!
//! Chunks are ranked by how many distinct query terms they contain. Ties keep
//! catalog order, and chunks with no overlap are never returned.

use std::collections::HashSet;

/// Chunks returned per query by default.
pub const DEFAULT_TOP_K: usize = 5;

const NO_CONTEXT: &str = "No relevant expert context found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeChunk {
    pub source: &'static str,
    pub text: &'static str,
}

const CURATED: &[KnowledgeChunk] = &[
    KnowledgeChunk {
        source: "Curated Econ Notes: GDP",
        text: "GDP: Nominal Gross Domestic Product measures total economic output in current dollars. \
               Quarterly, billions of dollars, seasonally adjusted annual rate. Important for business \
               pricing as it captures both real growth and inflation.",
    },
    KnowledgeChunk {
        source: "Curated Econ Notes: CPIAUCSL",
        text: "CPIAUCSL (CPI): Headline Consumer Price Index, all items, monthly index. Tracks average consumer \
               prices; the YoY change is the usual inflation gauge. Businesses watch it for wage/price \
               spiral risks.",
    },
    KnowledgeChunk {
        source: "Curated Econ Notes: UNRATE",
        text: "UNRATE: Civilian unemployment rate, monthly percent. A low unemployment rate signals a tight \
               labor market with upward wage pressure and a potential margin squeeze.",
    },
    KnowledgeChunk {
        source: "Curated Econ Notes: FEDFUNDS",
        text: "FEDFUNDS: Effective Federal Funds Rate, the Fed's main policy tool, monthly percent. Rising \
               interest rates increase borrowing costs and cool demand.",
    },
    KnowledgeChunk {
        source: "Curated Econ Notes: PPIACO",
        text: "PPIACO (PPI): Producer Price Index for all commodities, wholesale inflation, monthly index. A leading \
               indicator for consumer prices; high PPI often forces pricing adjustments to protect margins.",
    },
    KnowledgeChunk {
        source: "Curated Econ Notes: Core vs Headline",
        text: "Core vs Headline inflation: core excludes volatile food and energy prices and is preferred for \
               Fed policy. Headline inflation is what consumers and businesses actually feel.",
    },
    KnowledgeChunk {
        source: "Curated Econ Notes: Core PCE",
        text: "Core PCE: Personal Consumption Expenditures price index, the Fed's favored inflation measure. \
               Less volatile than CPI and better suited to long-term pricing strategy.",
    },
    KnowledgeChunk {
        source: "BLS Metadata CES0500000003",
        text: "Average Hourly Earnings of All Employees, Total Private (CES0500000003). Average hourly \
               earnings on private nonfarm payrolls, seasonally adjusted, dollars per hour, monthly. \
               Measures private-sector wage growth; key for tracking wage inflation, labor costs and \
               wage-price spirals.",
    },
    KnowledgeChunk {
        source: "Treasury Metadata Debt to the Penny",
        text: "Debt to the Penny: daily total public debt outstanding of the U.S. Treasury (record_date, \
               tot_pub_debt_out_amt), reported here in billions of dollars. Measures gross federal debt; \
               key for debt/GDP ratios and fiscal sustainability. High ratios may signal fiscal pressure \
               on interest rates and economic growth.",
    },
];

/// Words too common to count as overlap.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in", "is", "it",
    "of", "on", "or", "the", "this", "to", "was", "what", "when", "why", "will", "with",
];

#[derive(Debug, Clone)]
pub struct ContextRetriever {
    chunks: Vec<KnowledgeChunk>,
    k: usize,
}

impl Default for ContextRetriever {
    fn default() -> Self {
        Self::curated()
    }
}

impl ContextRetriever {
    pub fn new(chunks: Vec<KnowledgeChunk>, k: usize) -> Self {
        Self { chunks, k }
    }

    /// Built-in notes for the series catalog.
    pub fn curated() -> Self {
        Self::new(CURATED.to_vec(), DEFAULT_TOP_K)
    }

    pub fn retrieve(&self, query: &str) -> Vec<&KnowledgeChunk> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(idx, chunk)| {
                let words = tokenize(&format!("{} {}", chunk.source, chunk.text));
                let score = terms.intersection(&words).count();
                (score > 0).then_some((idx, score))
            })
            .collect();
        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().take(self.k).map(|(idx, _)| &self.chunks[idx]).collect()
    }

    /// Retrieved chunks as a `Source: ...` block for the prompt.
    pub fn render(&self, query: &str) -> String {
        let hits = self.retrieve(query);
        if hits.is_empty() {
            return NO_CONTEXT.to_string();
        }
        hits.iter()
            .map(|c| format!("Source: {}\n{}", c.source, c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2)
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}
