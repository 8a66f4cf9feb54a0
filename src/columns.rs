use serde::Serialize;

/// Semantic columns the aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Status,
    SalesAgent,
    Office,
    InternetFlag,
    TvFlag,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Status => "status",
            Role::SalesAgent => "sales agent",
            Role::Office => "office",
            Role::InternetFlag => "internet flag",
            Role::TvFlag => "tv flag",
        }
    }
}

/// How a role is found in the header row.
struct Matcher {
    role: Role,
    contains: &'static [&'static str],
    equals: &'static [&'static str],
    default: usize,
}

// Indexed by `Role` discriminant.
const MATCHERS: [Matcher; 5] = [
    Matcher {
        role: Role::Status,
        contains: &["status"],
        equals: &[],
        default: 0,
    },
    Matcher {
        role: Role::SalesAgent,
        contains: &["sales agent"],
        equals: &[],
        default: 0,
    },
    Matcher {
        role: Role::Office,
        contains: &["office", "location"],
        equals: &["a"],
        default: 0,
    },
    // Service columns H and I when the headers don't say.
    Matcher {
        role: Role::InternetFlag,
        contains: &["internet", "data"],
        equals: &[],
        default: 7,
    },
    Matcher {
        role: Role::TvFlag,
        contains: &["tv", "television"],
        equals: &[],
        default: 8,
    },
];

/// Column B holds the rep name whenever the sheet has one.
const SALES_AGENT_POSITION: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub index: usize,
    /// False when the index is a fallback default.
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnIndex {
    pub status: Resolved,
    pub sales_agent: Resolved,
    pub office: Resolved,
    pub internet_flag: Resolved,
    pub tv_flag: Resolved,
}

impl ColumnIndex {
    pub fn resolve(headers: &[String]) -> Self {
        let by_name = |role: Role| {
            let matcher = &MATCHERS[role as usize];
            match position(headers, matcher.contains, matcher.equals) {
                Some(index) => Resolved {
                    index,
                    matched: true,
                },
                None => Resolved {
                    index: matcher.default,
                    matched: false,
                },
            }
        };

        let sales_agent = if headers.len() > 1 {
            Resolved {
                index: SALES_AGENT_POSITION,
                matched: true,
            }
        } else {
            by_name(Role::SalesAgent)
        };

        Self {
            status: by_name(Role::Status),
            sales_agent,
            office: by_name(Role::Office),
            internet_flag: by_name(Role::InternetFlag),
            tv_flag: by_name(Role::TvFlag),
        }
    }

    pub fn get(&self, role: Role) -> Resolved {
        match role {
            Role::Status => self.status,
            Role::SalesAgent => self.sales_agent,
            Role::Office => self.office,
            Role::InternetFlag => self.internet_flag,
            Role::TvFlag => self.tv_flag,
        }
    }

    /// Roles that fell back to a default index.
    pub fn defaulted(&self) -> Vec<Role> {
        MATCHERS
            .iter()
            .map(|m| m.role)
            .filter(|role| !self.get(*role).matched)
            .collect()
    }
}

/// First header whose lowercased text contains `needle`.
pub fn find_header(headers: &[String], needle: &str) -> Option<usize> {
    position(headers, &[needle.to_lowercase().as_str()], &[])
}

fn position(headers: &[String], contains: &[&str], equals: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let lower = header.to_lowercase();
        contains.iter().any(|needle| lower.contains(needle))
            || equals.iter().any(|exact| lower.trim() == *exact)
    })
}
