use serde::Serialize;

/// An iNaturalist user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: u64,
    pub login: String,
    pub display_name: Option<String>,
    pub icon_url: Option<String>,
}

impl UserProfile {
    /// `login (Name)` or just `login`
    pub fn label(&self) -> String {
        match self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => format!("{} ({})", self.login, name),
            None => self.login.clone(),
        }
    }
}
