pub mod users {

    pub const LENGTH_NAME: usize = 150;

    pub const LENGTH_EMAIL: usize = 254;

    /// Usernames that can never be registered, regardless of case.
    pub const RESERVED_USERNAMES: &[&str] = &["me"];
}

pub mod titles {

    pub const LENGTH_NAME: usize = 256;

    pub const LENGTH_SLUG: usize = 50;

    /// Floor of the smallint year column.
    pub const MIN_YEAR: i32 = -32768;
}

pub mod reviews {

    pub const MIN_SCORE: i16 = 1;

    pub const MAX_SCORE: i16 = 10;
}

pub mod pagination {

    pub const DEFAULT_LIMIT: u64 = 50;

    pub const MAX_LIMIT: u64 = 1000;
}

pub mod mail {

    pub const SIGNUP_SUBJECT: &str = "Site registration";
}
