// Data shapes shared by the form controller and the API client: the two
// input records held while the user types, their enumerated option sets,
// and the payloads sent to the backend.

use crate::preview::ImageFile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two registration schemas the form is collecting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Individual,
    Company,
}

impl Mode {
    /// Fields editable in this mode, in display order.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Mode::Individual => &[
                Field::FullName,
                Field::Username,
                Field::Email,
                Field::Password,
                Field::ConfirmPassword,
                Field::JobTitle,
                Field::Department,
                Field::Role,
            ],
            Mode::Company => &[
                Field::CompanyName,
                Field::CompanyEmail,
                Field::CompanySize,
                Field::Industry,
                Field::AdminName,
                Field::AdminUsername,
                Field::AdminEmail,
                Field::Password,
                Field::ConfirmPassword,
            ],
        }
    }

    /// Label of the image this mode uploads.
    pub fn image_label(self) -> &'static str {
        match self {
            Mode::Individual => "Profile picture",
            Mode::Company => "Company logo",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    FullName,
    Username,
    Email,
    Password,
    ConfirmPassword,
    JobTitle,
    Department,
    Role,
    CompanyName,
    CompanyEmail,
    CompanySize,
    Industry,
    AdminName,
    AdminUsername,
    AdminEmail,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::FullName => "Full name",
            Field::Username => "Username",
            Field::Email => "Email",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm password",
            Field::JobTitle => "Job title (optional)",
            Field::Department => "Department (optional)",
            Field::Role => "Role",
            Field::CompanyName => "Company name",
            Field::CompanyEmail => "Company email",
            Field::CompanySize => "Company size (optional)",
            Field::Industry => "Industry (optional)",
            Field::AdminName => "Admin full name",
            Field::AdminUsername => "Admin username",
            Field::AdminEmail => "Admin email",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Field::Password | Field::ConfirmPassword)
    }

    /// Allowed values for enumerated fields, `None` for free text.
    pub fn options(self) -> Option<&'static [&'static str]> {
        match self {
            Field::Role => Some(Role::NAMES),
            Field::CompanySize => Some(CompanySize::NAMES),
            Field::Industry => Some(Industry::NAMES),
            _ => None,
        }
    }
}

/// Raised when a string is not one of an option set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{value:?} is not a valid {kind}")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

// Generates the serde/Display/FromStr plumbing for a closed option set.
macro_rules! option_set {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownOption { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

option_set!(Role, "role", {
    Employee => "employee",
    Admin => "admin",
});

option_set!(CompanySize, "company size", {
    Micro => "1-10",
    Small => "11-50",
    Medium => "51-200",
    Large => "201-500",
    Enterprise => "500+",
});

option_set!(Industry, "industry", {
    Technology => "technology",
    Healthcare => "healthcare",
    Finance => "finance",
    Education => "education",
    Retail => "retail",
    Manufacturing => "manufacturing",
    Other => "other",
});

impl Default for Role {
    fn default() -> Self {
        Role::Employee
    }
}

/// What the user has typed for an individual account.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndividualRegistrationInput {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub job_title: String,
    pub department: String,
    pub role: Role,
    pub profile_picture: Option<ImageFile>,
}

/// What the user has typed for a company workspace and its admin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompanyRegistrationInput {
    pub company_name: String,
    pub company_email: String,
    pub admin_name: String,
    pub admin_username: String,
    pub admin_email: String,
    pub password: String,
    pub confirm_password: String,
    pub company_size: Option<CompanySize>,
    pub industry: Option<Industry>,
    pub logo: Option<ImageFile>,
}

impl CompanyRegistrationInput {
    /// True when every field the backend needs has a value.
    pub fn has_required_fields(&self) -> bool {
        [
            &self.company_name,
            &self.company_email,
            &self.admin_name,
            &self.admin_username,
            &self.admin_email,
            &self.password,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

/// Body of `POST /auth/register`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndividualRegistration {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub role: Role,
    pub profile_pic_url: String,
}

impl IndividualRegistration {
    pub fn from_input(input: &IndividualRegistrationInput, profile_pic_url: String) -> Self {
        IndividualRegistration {
            full_name: input.full_name.trim().to_string(),
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            password: input.password.clone(),
            job_title: non_empty(&input.job_title),
            department: non_empty(&input.department),
            role: input.role,
            profile_pic_url,
        }
    }
}

/// Body of `POST /auth/register-company`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompanyRegistration {
    pub company_name: String,
    pub company_email: String,
    pub company_logo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<CompanySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_username: String,
    pub password: String,
}

impl CompanyRegistration {
    pub fn from_input(input: &CompanyRegistrationInput, company_logo_url: String) -> Self {
        CompanyRegistration {
            company_name: input.company_name.trim().to_string(),
            company_email: input.company_email.trim().to_string(),
            company_logo_url,
            company_size: input.company_size,
            industry: input.industry,
            admin_name: input.admin_name.trim().to_string(),
            admin_email: input.admin_email.trim().to_string(),
            admin_username: input.admin_username.trim().to_string(),
            password: input.password.clone(),
        }
    }
}

/// Where the user lands after a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub message: String,
    pub company_login: bool,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
