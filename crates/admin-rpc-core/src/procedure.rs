//! Typed procedures exposed by each peer.
//!
//! Inbound calls are decoded into one of these enums before dispatch, so a
//! handler table is an exhaustive `match` with an explicit unknown arm here
//! rather than a lookup by name.

use serde_json::Value;

use crate::{
    CallMessage, DispatchError,
    model::{Group, Question, Student},
};

/// Procedure names as they appear on the wire.
pub mod names {
    pub const CONNECTION_REPLACED: &str = "connection-replaced";
    pub const LOGIN_PROMPT: &str = "login-prompt";
    pub const GROUP_LIST: &str = "group-list";
    pub const STUDENTS_LIST: &str = "students-list";
    pub const STUDENT_DETAIL: &str = "student-detail";
    pub const SET_COOKIE: &str = "set-cookie";

    pub const LOGIN: &str = "login";
    pub const SHOW_SECTION: &str = "show-section";
    pub const LIST_GROUPS: &str = "list-groups";
}

/// A set of procedures one peer exposes to the other.
pub trait Procedure: Sized {
    /// Wire name of this call.
    fn name(&self) -> &'static str;

    /// Decode an inbound call.
    ///
    /// # Errors
    /// Returns `UnknownProcedure` for names outside this set and `Protocol`
    /// when the arguments do not match the signature.
    fn from_call(call: CallMessage) -> Result<Self, DispatchError>;

    /// Encode an outbound call.
    ///
    /// # Errors
    /// Returns error if an argument cannot be serialized.
    fn to_call(&self) -> Result<CallMessage, DispatchError>;
}

/// Procedures the admin client exposes; invoked by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientProcedure {
    /// A newer login took over this connection.
    ConnectionReplaced,
    /// Show the login screen.
    LoginPrompt,
    /// Show all groups and their sections.
    GroupList { groups: Vec<Group> },
    /// Show one section as a student table.
    StudentsList {
        group: String,
        questions: Vec<Question>,
        students: Vec<Student>,
    },
    /// Show a single student's progress.
    StudentDetail {
        group: String,
        student: String,
        questions: Vec<Question>,
        detail: Value,
    },
    /// Persist resumption credentials.
    SetCookie { name: String, key: String },
}

/// Procedures the server exposes; invoked by the admin client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerProcedure {
    Login { name: String, password: String },
    ShowSection { group: String, section: String },
    ListGroups,
}

impl Procedure for ClientProcedure {
    fn name(&self) -> &'static str {
        match self {
            Self::ConnectionReplaced => names::CONNECTION_REPLACED,
            Self::LoginPrompt => names::LOGIN_PROMPT,
            Self::GroupList { .. } => names::GROUP_LIST,
            Self::StudentsList { .. } => names::STUDENTS_LIST,
            Self::StudentDetail { .. } => names::STUDENT_DETAIL,
            Self::SetCookie { .. } => names::SET_COOKIE,
        }
    }

    fn from_call(call: CallMessage) -> Result<Self, DispatchError> {
        let (procedure, mut args) = call.into_args();
        let decoded = match procedure.as_str() {
            names::CONNECTION_REPLACED => Self::ConnectionReplaced,
            names::LOGIN_PROMPT => Self::LoginPrompt,
            names::GROUP_LIST => Self::GroupList {
                groups: args.next("groups")?,
            },
            names::STUDENTS_LIST => {
                let group = args.next("group")?;
                let questions: Vec<Question> = args.next("questions")?;
                let students: Vec<Student> = args.next("students")?;
                if let Some(row) = students
                    .iter()
                    .position(|s| s.answers.len() != questions.len())
                {
                    return Err(DispatchError::Protocol(format!(
                        "{procedure}: student {row} has {} answers for {} questions",
                        students[row].answers.len(),
                        questions.len()
                    )));
                }
                Self::StudentsList {
                    group,
                    questions,
                    students,
                }
            }
            names::STUDENT_DETAIL => Self::StudentDetail {
                group: args.next("group")?,
                student: args.next("student")?,
                questions: args.next("questions")?,
                detail: args.next("detail")?,
            },
            names::SET_COOKIE => Self::SetCookie {
                name: args.next("name")?,
                key: args.next("key")?,
            },
            _ => return Err(DispatchError::UnknownProcedure(procedure)),
        };
        if args.remaining() > 0 {
            tracing::debug!(
                procedure = decoded.name(),
                extra = args.remaining(),
                "ignoring surplus arguments"
            );
        }
        Ok(decoded)
    }

    fn to_call(&self) -> Result<CallMessage, DispatchError> {
        let call = CallMessage::new(self.name());
        match self {
            Self::ConnectionReplaced | Self::LoginPrompt => Ok(call),
            Self::GroupList { groups } => call.arg(groups),
            Self::StudentsList {
                group,
                questions,
                students,
            } => call.arg(group)?.arg(questions)?.arg(students),
            Self::StudentDetail {
                group,
                student,
                questions,
                detail,
            } => call.arg(group)?.arg(student)?.arg(questions)?.arg(detail),
            Self::SetCookie { name, key } => call.arg(name)?.arg(key),
        }
    }
}

impl Procedure for ServerProcedure {
    fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => names::LOGIN,
            Self::ShowSection { .. } => names::SHOW_SECTION,
            Self::ListGroups => names::LIST_GROUPS,
        }
    }

    fn from_call(call: CallMessage) -> Result<Self, DispatchError> {
        let (procedure, mut args) = call.into_args();
        match procedure.as_str() {
            names::LOGIN => Ok(Self::Login {
                name: args.next("name")?,
                password: args.next("password")?,
            }),
            names::SHOW_SECTION => Ok(Self::ShowSection {
                group: args.next("group")?,
                section: args.next("section")?,
            }),
            names::LIST_GROUPS => Ok(Self::ListGroups),
            _ => Err(DispatchError::UnknownProcedure(procedure)),
        }
    }

    fn to_call(&self) -> Result<CallMessage, DispatchError> {
        let call = CallMessage::new(self.name());
        match self {
            Self::Login { name, password } => call.arg(name)?.arg(password),
            Self::ShowSection { group, section } => call.arg(group)?.arg(section),
            Self::ListGroups => Ok(call),
        }
    }
}
