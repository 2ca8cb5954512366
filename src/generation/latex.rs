// src/generation/latex.rs
//! Resume LaTeX rendering: escape user data, assemble the document from
//! the optimized content. The template is deliberately plain moderncv-free
//! article-class LaTeX so the compiler service needs no extra packages.

use crate::clients::content::OptimizedContent;
use crate::models::PersonalInfo;

/// Escape LaTeX special characters in user-supplied text.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str(r"\&"),
            '%' => escaped.push_str(r"\%"),
            '$' => escaped.push_str(r"\$"),
            '#' => escaped.push_str(r"\#"),
            '_' => escaped.push_str(r"\_"),
            '{' => escaped.push_str(r"\{"),
            '}' => escaped.push_str(r"\}"),
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            '\\' => escaped.push_str(r"\textbackslash{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the full LaTeX document for a tailored resume.
pub fn render_resume(
    personal: &PersonalInfo,
    job_title: &str,
    content: &OptimizedContent,
) -> String {
    let mut doc = String::new();

    doc.push_str("\\documentclass[11pt,a4paper]{article}\n");
    doc.push_str("\\usepackage[margin=2cm]{geometry}\n");
    doc.push_str("\\usepackage{enumitem}\n");
    doc.push_str("\\usepackage{titlesec}\n");
    doc.push_str("\\titleformat{\\section}{\\large\\bfseries}{}{0em}{}[\\titlerule]\n");
    doc.push_str("\\setlist[itemize]{noitemsep,topsep=2pt,leftmargin=1.2em}\n");
    doc.push_str("\\pagestyle{empty}\n\n");
    doc.push_str("\\begin{document}\n\n");

    // Header block
    doc.push_str(&format!(
        "\\begin{{center}}\n{{\\LARGE\\bfseries {}}}\\\\[2pt]\n",
        escape_latex(&personal.name)
    ));
    doc.push_str(&format!("{{\\large {}}}\\\\[4pt]\n", escape_latex(job_title)));

    let mut contact_parts = vec![escape_latex(&personal.email)];
    if let Some(phone) = &personal.phone {
        contact_parts.push(escape_latex(phone));
    }
    if let Some(location) = &personal.location {
        contact_parts.push(escape_latex(location));
    }
    for link in &personal.links {
        contact_parts.push(escape_latex(link));
    }
    doc.push_str(&contact_parts.join(" \\,$\\cdot$\\, "));
    doc.push_str("\n\\end{center}\n\n");

    // Summary
    doc.push_str("\\section{Summary}\n");
    doc.push_str(&escape_latex(&content.summary));
    doc.push_str("\n\n");

    // Experience
    doc.push_str("\\section{Experience}\n");
    for experience in &content.experiences {
        doc.push_str(&format!(
            "\\textbf{{{}}} \\hfill {}\\\\\n\\textit{{{}}}\n",
            escape_latex(&experience.role),
            escape_latex(&experience.period),
            escape_latex(&experience.company),
        ));
        if !experience.bullets.is_empty() {
            doc.push_str("\\begin{itemize}\n");
            for bullet in &experience.bullets {
                doc.push_str(&format!("  \\item {}\n", escape_latex(bullet)));
            }
            doc.push_str("\\end{itemize}\n");
        }
        doc.push('\n');
    }

    // Skills
    if !content.highlighted_skills.is_empty() {
        doc.push_str("\\section{Skills}\n");
        let skills: Vec<String> = content
            .highlighted_skills
            .iter()
            .map(|s| escape_latex(s))
            .collect();
        doc.push_str(&skills.join(" \\,$\\cdot$\\, "));
        doc.push_str("\n\n");
    }

    doc.push_str("\\end{document}\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::content::OptimizedExperience;

    fn personal() -> PersonalInfo {
        PersonalInfo {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+41 00 000 00 00".to_string()),
            location: Some("Geneva".to_string()),
            links: vec!["github.com/ada".to_string()],
        }
    }

    fn content() -> OptimizedContent {
        OptimizedContent {
            summary: "Engineer with 100% focus on R&D pipelines".to_string(),
            experiences: vec![OptimizedExperience {
                role: "Staff Engineer".to_string(),
                company: "Babbage & Co".to_string(),
                period: "2019 - present".to_string(),
                bullets: vec!["Cut compute costs by ~30%".to_string()],
            }],
            highlighted_skills: vec!["Rust".to_string(), "C#".to_string()],
        }
    }

    #[test]
    fn test_special_characters_are_escaped() {
        assert_eq!(escape_latex("R&D at 100%"), r"R\&D at 100\%");
        assert_eq!(escape_latex("a_b{c}"), r"a\_b\{c\}");
        assert_eq!(escape_latex(r"C:\temp"), r"C:\textbackslash{}temp");
        assert_eq!(escape_latex("x^2 ~y"), r"x\textasciicircum{}2 \textasciitilde{}y");
    }

    #[test]
    fn test_rendered_document_is_complete_and_escaped() {
        let doc = render_resume(&personal(), "Platform Engineer", &content());

        assert!(doc.starts_with("\\documentclass"));
        assert!(doc.ends_with("\\end{document}\n"));
        assert!(doc.contains("Ada Lovelace"));
        assert!(doc.contains("Platform Engineer"));
        assert!(doc.contains(r"Babbage \& Co"));
        assert!(doc.contains(r"by \textasciitilde{}30\%"));
        assert!(doc.contains(r"C\#"));
        // No raw specials from user data survive outside commands
        assert!(!doc.contains("Babbage & Co"));
    }

    #[test]
    fn test_skills_section_omitted_when_empty() {
        let mut content = content();
        content.highlighted_skills.clear();
        let doc = render_resume(&personal(), "Platform Engineer", &content);
        assert!(!doc.contains("\\section{Skills}"));
    }
}
