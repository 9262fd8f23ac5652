//! Skill normalisation and the controlled vocabulary used when a posting has
//! no explicit skill tags.

use crate::models::job::JobPosting;

/// Technology terms scanned for in free-text requirements.
pub const COMMON_SKILLS: &[&str] = &[
    "JavaScript",
    "React",
    "Node.js",
    "Python",
    "Java",
    "TypeScript",
    "HTML",
    "CSS",
    "Angular",
    "Vue.js",
    "PHP",
    "C#",
    "C++",
    "Go",
    "Ruby",
    "Swift",
    "Kotlin",
    "SQL",
    "MongoDB",
    "PostgreSQL",
    "MySQL",
    "Redis",
    "Docker",
    "Kubernetes",
    "AWS",
    "Azure",
    "GCP",
    "Git",
    "Jenkins",
    "Terraform",
    "Linux",
];

/// Returns the skills a posting requires: its explicit tags, or the vocabulary
/// terms found (case-insensitive substring) in its requirements text.
pub fn required_skills(job: &JobPosting) -> Vec<String> {
    if !job.skills.is_empty() {
        return job.skills.clone();
    }

    match job.requirements.as_deref() {
        Some(text) => skills_in_text(text),
        None => Vec::new(),
    }
}

/// Plain substring scan, so short terms like "Go" also hit inside longer words.
pub fn skills_in_text(text: &str) -> Vec<String> {
    let text = text.to_lowercase();
    COMMON_SKILLS
        .iter()
        .filter(|skill| text.contains(&skill.to_lowercase()))
        .map(|skill| skill.to_string())
        .collect()
}

/// Lowercases, trims, drops blanks and de-duplicates while keeping first-seen order.
pub fn normalize_skills<S: AsRef<str>>(skills: &[S]) -> Vec<String> {
    let mut seen = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.as_ref().trim().to_lowercase();
        if !skill.is_empty() && !seen.contains(&skill) {
            seen.push(skill);
        }
    }
    seen
}

/// Upper-cases the first letter of every word: "node.js" → "Node.js".
pub fn display_skill(skill: &str) -> String {
    skill
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().to_string() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
