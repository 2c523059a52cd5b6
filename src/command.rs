use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtraParam {
    pub param_name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Profile,
    Full,
    Stories,
    Domain,
    AccountInfo,
    Following,
    Comments,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Profile,
        Command::Full,
        Command::Stories,
        Command::Domain,
        Command::AccountInfo,
        Command::Following,
        Command::Comments,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "profile" => Some(Self::Profile),
            "full" => Some(Self::Full),
            "stories" => Some(Self::Stories),
            "domain" => Some(Self::Domain),
            "account_info" => Some(Self::AccountInfo),
            "following" => Some(Self::Following),
            "comments" => Some(Self::Comments),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Full => "full",
            Self::Stories => "stories",
            Self::Domain => "domain",
            Self::AccountInfo => "account_info",
            Self::Following => "following",
            Self::Comments => "comments",
        }
    }

    pub fn extra_param(&self) -> Option<ExtraParam> {
        match self {
            Self::Following => Some(ExtraParam {
                param_name: "limit",
                label: "Limit (optional)",
                placeholder: "e.g. 100 or full",
                required: false,
            }),
            Self::Comments => Some(ExtraParam {
                param_name: "video_url",
                label: "Video URL",
                placeholder: "Enter full video URL",
                required: true,
            }),
            _ => None,
        }
    }

    /// Commands that need a lifetime-tier API key upstream.
    pub fn is_lifetime_restricted(&self) -> bool {
        matches!(
            self,
            Self::Stories | Self::Domain | Self::Following | Self::Comments | Self::AccountInfo
        )
    }

    /// Comments are looked up by video URL, so no username is needed.
    pub fn requires_username(&self) -> bool {
        !matches!(self, Self::Comments)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
