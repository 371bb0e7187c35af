use regex::Regex;
use semver::Version;
use std::num::ParseIntError;
use std::sync::LazyLock;
use thiserror::Error;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9.]{5}").expect("Must be valid regex"));

const INITIAL_VERSION: &str = "0.0.0";

#[derive(Error, Debug, PartialEq)]
pub enum VersionError {
    #[error("{0} must consist of exactly three dot separated components")]
    ComponentCount(String),
    #[error("Cannot parse component {component:?} of {version}")]
    Component {
        version: String,
        component: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Major,
    Minor,
    Patch,
}

impl Section {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "major" => Some(Section::Major),
            "minor" => Some(Section::Minor),
            "patch" => Some(Section::Patch),
            _ => None,
        }
    }

    fn component(self, version: &mut Version) -> &mut u64 {
        match self {
            Section::Major => &mut version.major,
            Section::Minor => &mut version.minor,
            Section::Patch => &mut version.patch,
        }
    }
}

/// Resolves the current version from the output of `git tag`.
///
/// The last five character run of digits and dots wins. Without any match the
/// repository is considered untagged and `0.0.0` is returned.
pub fn latest_version(tag_listing: &str) -> Result<Version, VersionError> {
    let current = VERSION_PATTERN
        .find_iter(tag_listing)
        .last()
        .map(|m| m.as_str())
        .unwrap_or(INITIAL_VERSION);

    parse(current)
}

pub fn parse(version: &str) -> Result<Version, VersionError> {
    let components = version.split('.').collect::<Vec<_>>();
    let &[major, minor, patch] = components.as_slice() else {
        return Err(VersionError::ComponentCount(version.to_string()));
    };

    let component = |component: &str| {
        component
            .parse::<u64>()
            .map_err(|source| VersionError::Component {
                version: version.to_string(),
                component: component.to_string(),
                source,
            })
    };

    Ok(Version::new(
        component(major)?,
        component(minor)?,
        component(patch)?,
    ))
}

/// Increments the component named by `section` and returns whether one was
/// named. Lower components are not reset.
pub fn bump(version: &mut Version, section: &str) -> bool {
    match Section::from_name(section) {
        Some(section) => {
            *section.component(version) += 1;
            true
        }
        None => false,
    }
}
