use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    Summary,
    Experience,
    Skills,
    Projects,
    Education,
    Certificates,
}

impl SectionKind {
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Header => "",
            SectionKind::Summary => "About Me",
            SectionKind::Experience => "Work Experience",
            SectionKind::Skills => "Skills",
            SectionKind::Projects => "Key Projects",
            SectionKind::Education => "Education",
            SectionKind::Certificates => "Certificates",
        }
    }
}

impl std::str::FromStr for SectionKind {
    type Err = String;

    /// Parses the names of the sections that carry a visibility flag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "experience" | "work-experience" => Ok(SectionKind::Experience),
            "skills" => Ok(SectionKind::Skills),
            "projects" => Ok(SectionKind::Projects),
            "education" => Ok(SectionKind::Education),
            "certificates" => Ok(SectionKind::Certificates),
            other => Err(format!(
                "unknown section '{other}' (expected experience, skills, projects, education or certificates)"
            )),
        }
    }
}

/// Per-section show/hide flags. `None` means visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SectionVisibility {
    pub experience: Option<bool>,
    pub skills: Option<bool>,
    pub projects: Option<bool>,
    pub education: Option<bool>,
    pub certificates: Option<bool>,
}

impl SectionVisibility {
    fn flag(&self, kind: SectionKind) -> Option<bool> {
        match kind {
            SectionKind::Experience => self.experience,
            SectionKind::Skills => self.skills,
            SectionKind::Projects => self.projects,
            SectionKind::Education => self.education,
            SectionKind::Certificates => self.certificates,
            SectionKind::Header | SectionKind::Summary => None,
        }
    }

    pub fn is_visible(&self, kind: SectionKind) -> bool {
        self.flag(kind).unwrap_or(true)
    }

    pub fn set(&mut self, kind: SectionKind, visible: bool) {
        let slot = match kind {
            SectionKind::Experience => &mut self.experience,
            SectionKind::Skills => &mut self.skills,
            SectionKind::Projects => &mut self.projects,
            SectionKind::Education => &mut self.education,
            SectionKind::Certificates => &mut self.certificates,
            SectionKind::Header | SectionKind::Summary => return,
        };
        *slot = Some(visible);
    }

    /// Explicit flags in `overrides` win over the ones in `self`.
    pub fn merged_with(&self, overrides: &SectionVisibility) -> SectionVisibility {
        SectionVisibility {
            experience: overrides.experience.or(self.experience),
            skills: overrides.skills.or(self.skills),
            projects: overrides.projects.or(self.projects),
            education: overrides.education.or(self.education),
            certificates: overrides.certificates.or(self.certificates),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Identity {
    pub full_name: String,
    pub photo_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub link: Option<String>,
    pub location: Option<String>,
}

impl ContactDetails {
    pub const SEPARATOR: &'static str = " | ";

    /// Present entries joined in email, phone, link, location order.
    pub fn line(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.email, &self.phone, &self.link, &self.location]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(Self::SEPARATOR))
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExperienceEntry {
    pub role: String,
    pub organization: String,
    pub period: String,
    pub bullets: Vec<String>,
}

impl ExperienceEntry {
    /// "Role at Organization", or whichever half is present.
    pub fn label(&self) -> String {
        match (self.role.trim(), self.organization.trim()) {
            ("", org) => org.to_string(),
            (role, "") => role.to_string(),
            (role, org) => format!("{role} at {org}"),
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.label().is_empty()
            && self.period.trim().is_empty()
            && self.bullets.iter().all(|b| b.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Skill {
    pub display_name: String,
    pub category: String,
}

#[derive(Clone, Debug, Default)]
pub struct ProjectSummary {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct EducationEntry {
    pub credential_name: String,
    pub institution: String,
    pub period: String,
    pub details: String,
}

impl EducationEntry {
    pub fn label(&self) -> String {
        match (self.credential_name.trim(), self.institution.trim()) {
            ("", inst) => inst.to_string(),
            (cred, "") => cred.to_string(),
            (cred, inst) => format!("{cred}, {inst}"),
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.label().is_empty() && self.period.trim().is_empty() && self.details.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Certificate {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

impl Certificate {
    pub(crate) fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.issuer.trim().is_empty() && self.date.trim().is_empty()
    }
}

/// Everything a CV render needs, assembled once from the content store.
#[derive(Clone, Debug, Default)]
pub struct ProfileDocument {
    pub identity: Identity,
    pub summary: String,
    pub contact: ContactDetails,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<Skill>,
    pub projects: Vec<ProjectSummary>,
    pub education: Vec<EducationEntry>,
    pub certificates: Vec<Certificate>,
    pub section_visibility: SectionVisibility,
}

impl ProfileDocument {
    /// Parse a content-store snapshot (JSON) into a profile.
    pub fn from_snapshot_json(json: &str) -> Result<Self, crate::Error> {
        let snapshot: ContentSnapshot = serde_json::from_str(json)?;
        Ok(snapshot.into())
    }

    /// Skills grouped by category. Categories keep first-seen order, names keep input order.
    pub fn skill_groups(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for skill in &self.skills {
            let name = skill.display_name.trim();
            if name.is_empty() {
                continue;
            }
            let category = skill.category.trim();
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, names)) => names.push(name),
                None => groups.push((category, vec![name])),
            }
        }
        groups
    }

    /// True when the section has nothing to render, regardless of visibility.
    pub fn section_is_empty(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::Header => false,
            SectionKind::Summary => self.summary.trim().is_empty(),
            SectionKind::Experience => self.experience.iter().all(ExperienceEntry::is_blank),
            SectionKind::Skills => self.skill_groups().is_empty(),
            SectionKind::Projects => self.projects.iter().all(|p| p.title.trim().is_empty()),
            SectionKind::Education => self.education.iter().all(EducationEntry::is_blank),
            SectionKind::Certificates => self.certificates.iter().all(Certificate::is_blank),
        }
    }
}

// Content store record shapes. Keys follow the store's camelCase JSON; every
// field defaults so partially filled snapshots still load.

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentSnapshot {
    pub settings: SnapshotSettings,
    pub work_experience: Vec<SnapshotExperience>,
    pub skills: Vec<SnapshotSkill>,
    pub projects: Vec<SnapshotProject>,
    pub education: Vec<SnapshotEducation>,
    pub certificates: Vec<SnapshotCertificate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotSettings {
    pub about_me: SnapshotAboutMe,
    pub contact_details: SnapshotContactDetails,
    pub cv_sections: SectionVisibility,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotAboutMe {
    pub name: String,
    pub photo_url: Option<String>,
    pub professional_summary: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotExperience {
    pub role: String,
    pub company: String,
    pub period: String,
    pub description: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotSkill {
    pub name: String,
    pub category: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotProject {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotEducation {
    pub degree: String,
    pub institution: String,
    pub period: String,
    pub details: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotCertificate {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

impl From<ContentSnapshot> for ProfileDocument {
    fn from(s: ContentSnapshot) -> Self {
        let about = s.settings.about_me;
        let contact = s.settings.contact_details;
        ProfileDocument {
            identity: Identity {
                full_name: about.name,
                photo_url: about.photo_url.filter(|u| !u.trim().is_empty()),
            },
            summary: about.professional_summary,
            contact: ContactDetails {
                email: contact.email,
                phone: contact.phone,
                link: contact.linkedin,
                location: contact.location,
            },
            experience: s
                .work_experience
                .into_iter()
                .map(|e| ExperienceEntry {
                    role: e.role,
                    organization: e.company,
                    period: e.period,
                    bullets: e.description,
                })
                .collect(),
            skills: s
                .skills
                .into_iter()
                .map(|sk| Skill {
                    display_name: sk.name,
                    category: sk.category,
                })
                .collect(),
            projects: s
                .projects
                .into_iter()
                .map(|p| ProjectSummary {
                    title: p.title,
                    description: p.description,
                })
                .collect(),
            education: s
                .education
                .into_iter()
                .map(|e| EducationEntry {
                    credential_name: e.degree,
                    institution: e.institution,
                    period: e.period,
                    details: e.details,
                })
                .collect(),
            certificates: s
                .certificates
                .into_iter()
                .map(|c| Certificate {
                    name: c.name,
                    issuer: c.issuer,
                    date: c.date,
                })
                .collect(),
            section_visibility: s.settings.cv_sections,
        }
    }
}
