//! Entity snapshots handed to the mirror layer
//!
//! A snapshot is a read-only, fully-hydrated view of one primary-store
//! record plus its resolved relations, captured by the caller at the
//! moment of synchronization. The mirror only ever reads them.

use chrono::{NaiveDate, NaiveTime};

/// Gender as stored in the primary store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Storage code used by the primary store
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    /// Human-readable display label
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Patient,
    Psychologist,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Psychologist => "psychologist",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Psychologist => "Psychologist",
        }
    }
}

/// Psychologist specialty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialty {
    Clinical,
    Cognitive,
    Developmental,
    Social,
    Neuropsychology,
    Counseling,
}

impl Specialty {
    pub fn code(&self) -> &'static str {
        match self {
            Specialty::Clinical => "clinical",
            Specialty::Cognitive => "cognitive",
            Specialty::Developmental => "developmental",
            Specialty::Social => "social",
            Specialty::Neuropsychology => "neuropsychology",
            Specialty::Counseling => "counseling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Specialty::Clinical => "Clinical Psychology",
            Specialty::Cognitive => "Cognitive Psychology",
            Specialty::Developmental => "Developmental Psychology",
            Specialty::Social => "Social Psychology",
            Specialty::Neuropsychology => "Neuropsychology",
            Specialty::Counseling => "Counseling Psychology",
        }
    }
}

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn code(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No Show",
        }
    }
}

/// Resolved office relation on a doctor profile
#[derive(Debug, Clone)]
pub struct OfficeSnapshot {
    /// Primary-store office identifier
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Optional one-to-one doctor profile carried by psychologist accounts
#[derive(Debug, Clone)]
pub struct DoctorSnapshot {
    /// Primary-store doctor identifier
    pub id: i64,
    pub specialty: Specialty,
    /// Office assignment, resolved by the caller
    pub office: OfficeSnapshot,
}

/// Fully-hydrated account view
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// Primary-store account identifier
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub age: u32,
    pub gender: Gender,
    pub phone: String,
    pub role: Role,
    /// Present only for psychologists that completed onboarding
    pub doctor_profile: Option<DoctorSnapshot>,
}

impl AccountSnapshot {
    /// Full name of the account holder
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// Minimal identity of one side of an appointment
#[derive(Debug, Clone)]
pub struct PartySnapshot {
    /// Primary-store account identifier
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub email: String,
}

impl PartySnapshot {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// Fully-hydrated appointment view with both parties resolved
#[derive(Debug, Clone)]
pub struct AppointmentSnapshot {
    /// Primary-store appointment identifier
    pub id: i64,
    pub patient: PartySnapshot,
    pub psychologist: PartySnapshot,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: String,
}
