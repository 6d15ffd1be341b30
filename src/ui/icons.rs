pub struct Icons;

impl Icons {
    pub const TAG: &str = "🏷️";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const DATABASE: &str = "🗄️";
    pub const PERSON: &str = "👤";
    pub const PAGE: &str = "📄";
    pub const COPY: &str = "📋";
    pub const DEL: &str = "🗑️";
    pub const EMPTY: &str = "∅";
}
