//! Small hand-checkable datasets shared by unit tests.
//!
//! Five movies over two genres (Action, Comedy) rated by three users. User 4
//! exists but has rated nothing.
//!
//! | user | alpha | bravo | charlie | delta | echo |
//! |------|-------|-------|---------|-------|------|
//! | 1    | 5     | 5     | 4       |       |      |
//! | 2    | 4     | 5     |         | 3     | 2    |
//! | 3    | 1     |       | 2       | 5     | 5    |

use std::path::Path;

use super::loader::RawTables;

pub const RATINGS: &str = "\
1::10::5::978300760
1::20::5::978300761
1::30::4::978300762
2::10::4::978300763
2::20::5::978300764
2::40::3::978300765
2::50::2::978300766
3::10::1::978300767
3::30::2::978300768
3::40::5::978300769
3::50::5::978300770
1::10::5::978300760
1::99::5::978300771
9::10::4::978300772
";

pub const MOVIES: &str = "\
10::Alpha (1995)::Action
20::Bravo! (1996)::Action|Comedy
30::Charlie (1997)::Action
40::Delta (1998)::Action
50::Echo (1999)::Comedy
";

pub const USERS: &str = "\
1::F::1::10::48067
2::M::56::16::70072
3::M::25::15::55117
4::F::45::7::02460
";

pub fn raw_tables() -> RawTables {
    RawTables::parse(RATINGS.as_bytes(), MOVIES.as_bytes(), USERS.as_bytes())
        .expect("fixture parses")
}

pub fn write_dat_files(dir: &Path) {
    std::fs::write(dir.join(super::loader::RATINGS_FILE), RATINGS).unwrap();
    std::fs::write(dir.join(super::loader::MOVIES_FILE), MOVIES).unwrap();
    std::fs::write(dir.join(super::loader::USERS_FILE), USERS).unwrap();
}

/// Three users, four movies, two genres. User 1 rates movies 1-3 (5, 5, 4)
/// and leaves movie 4 unrated.
pub fn four_movie_tables() -> RawTables {
    let ratings = "\
1::1::5::1
1::2::5::2
1::3::4::3
2::1::3::4
2::4::4::5
3::2::2::6
3::4::5::7
";
    let movies = "\
1::Heat (1995)::Action
2::Speed (1994)::Action|Comedy
3::Ronin (1998)::Action
4::Face Off (1997)::Action
";
    let users = "\
1::F::1::10::48067
2::M::56::16::70072
3::M::25::15::55117
";
    RawTables::parse(ratings.as_bytes(), movies.as_bytes(), users.as_bytes())
        .expect("fixture parses")
}
