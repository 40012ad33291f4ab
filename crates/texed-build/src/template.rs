//! Skeleton for new documents

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// LaTeX document class offered for new documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentClass {
    #[default]
    Article,
    Report,
    Book,
}

impl DocumentClass {
    pub const ALL: [DocumentClass; 3] = [Self::Article, Self::Report, Self::Book];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Report => "report",
            Self::Book => "book",
        }
    }
}

impl fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.name() == s)
            .ok_or_else(|| format!("unknown document class '{}' (article, report, book)", s))
    }
}

/// Preamble choices for a new document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub class: DocumentClass,
    pub title: String,
    pub author: String,
    /// Packages, loaded in order
    pub packages: Vec<String>,
    /// Emit `\maketitle`
    pub title_page: bool,
}

impl Template {
    pub fn render(&self) -> String {
        let mut out = format!("\\documentclass{{{}}}\n\n", self.class);
        for package in &self.packages {
            out.push_str(&format!("\\usepackage{{{}}}\n", package));
        }
        out.push_str(&format!(
            "\n\\title{{{}}}\n\\author{{{}}}\n",
            self.title, self.author
        ));
        out.push_str("\n\\begin{document}\n\n");
        if self.title_page {
            out.push_str("\\maketitle\n");
        }
        out.push_str("\n\\end{document}");
        out
    }
}
