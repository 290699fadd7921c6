//! Sample data for a fresh database.
//!
//! Generated people have Brazilian names, a CPF with valid check digits and
//! a birth date putting them between 18 and 80 years old.

use chrono::{Datelike, Duration, Local, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use super::repository::PersonRepository;
use super::types::Person;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Beatriz", "Bruno", "Camila", "Carlos", "Daniel", "Eduarda", "Felipe", "Fernanda",
    "Gabriel", "Helena", "Igor", "Isabela", "João", "Julia", "Larissa", "Lucas", "Luiza",
    "Marcos", "Maria", "Mateus", "Natália", "Otávio", "Paulo", "Rafael", "Sofia", "Thiago",
    "Vitória",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Alves", "Araújo", "Barbosa", "Cardoso", "Carvalho", "Castro", "Costa", "Dias",
    "Ferreira", "Gomes", "Lima", "Martins", "Melo", "Moreira", "Nascimento", "Oliveira",
    "Pereira", "Ribeiro", "Rocha", "Santos", "Silva", "Sousa", "Teixeira",
];

const MIN_AGE: i32 = 18;
const MAX_AGE: i32 = 80;

/// CPF check digit over `digits`, weighted from `digits.len() + 1` down to 2.
fn check_digit(digits: &[u8]) -> u8 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * (weight_start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest as u8
    }
}

/// Complete nine base digits with the two CPF check digits.
pub fn cpf_digits(base: [u8; 9]) -> [u8; 11] {
    let mut digits = [0u8; 11];
    digits[..9].copy_from_slice(&base);
    digits[9] = check_digit(&digits[..9]);
    digits[10] = check_digit(&digits[..10]);
    digits
}

/// Format eleven digits as `000.000.000-00`.
pub fn format_cpf(digits: &[u8; 11]) -> String {
    let s: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    format!("{}.{}.{}-{}", &s[0..3], &s[3..6], &s[6..9], &s[9..11])
}

/// Whether `cpf` (punctuated or not) carries valid check digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u8> = cpf
        .chars()
        .filter(char::is_ascii_digit)
        .map(|c| c as u8 - b'0')
        .collect();
    if digits.len() != 11 || digits.iter().all(|&d| d == digits[0]) {
        return false;
    }
    digits[9] == check_digit(&digits[..9]) && digits[10] == check_digit(&digits[..10])
}

/// Random CPF with valid check digits.
///
/// Repeated-digit numbers such as `111.111.111-11` pass the checksum but are
/// not valid CPFs, so they are drawn again.
pub fn random_cpf<R: Rng + ?Sized>(rng: &mut R) -> String {
    loop {
        let mut base = [0u8; 9];
        for d in base.iter_mut() {
            *d = rng.gen_range(0..10);
        }
        let cpf = format_cpf(&cpf_digits(base));
        if is_valid_cpf(&cpf) {
            return cpf;
        }
    }
}

/// The same calendar day `years` earlier; 29 February falls back to the 28th.
fn years_before(today: NaiveDate, years: i32) -> NaiveDate {
    let year = today.year() - years;
    today
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, today.month(), 28))
        .unwrap_or(today)
}

/// Random birth date for someone between 18 and 80 years old on `today`.
pub fn random_birth_date<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> NaiveDate {
    let youngest = years_before(today, MIN_AGE);
    let oldest = years_before(today, MAX_AGE + 1) + Duration::days(1);
    let span = (youngest - oldest).num_days();
    oldest + Duration::days(rng.gen_range(0..=span))
}

/// Random person.
pub fn random_person<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Person {
    let name = FIRST_NAMES.choose(rng).copied().unwrap_or("Ana");
    let surname = LAST_NAMES.choose(rng).copied().unwrap_or("Silva");
    Person::new(
        name,
        surname,
        random_cpf(rng),
        random_birth_date(rng, today).format("%Y-%m-%d").to_string(),
    )
}

/// Create the schema and insert `count` generated people.
/// Returns how many rows were actually inserted.
pub fn seed(repo: &PersonRepository, count: usize) -> rusqlite::Result<usize> {
    repo.ensure_schema()?;

    let mut rng = rand::thread_rng();
    let today = Local::now().date_naive();
    let people: Vec<Person> = (0..count).map(|_| random_person(&mut rng, today)).collect();

    let inserted = repo.insert_many(&people)?;
    info!(inserted, path = %repo.path().display(), "Seeded sample people");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn computes_known_check_digits() {
        // 529.982.247-25 is a commonly cited valid CPF.
        assert_eq!(
            cpf_digits([5, 2, 9, 9, 8, 2, 2, 4, 7]),
            [5, 2, 9, 9, 8, 2, 2, 4, 7, 2, 5]
        );
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("123"));
    }

    #[test]
    fn random_cpfs_are_valid_and_formatted() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let cpf = random_cpf(&mut rng);
            assert_eq!(cpf.len(), 14);
            assert_eq!(&cpf[3..4], ".");
            assert_eq!(&cpf[11..12], "-");
            let digits: String = cpf.chars().filter(char::is_ascii_digit).collect();
            assert_eq!(cpf_digits_from_str(&digits), digits);
            assert!(is_valid_cpf(&cpf));
        }
    }

    fn cpf_digits_from_str(digits: &str) -> String {
        let mut base = [0u8; 9];
        for (slot, c) in base.iter_mut().zip(digits.chars()) {
            *slot = c as u8 - b'0';
        }
        cpf_digits(base).iter().map(|d| char::from(b'0' + d)).collect()
    }

    #[test]
    fn birth_dates_fall_in_age_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        for _ in 0..500 {
            let born = random_birth_date(&mut rng, today);
            let age = today.years_since(born).unwrap();
            assert!((18..=80).contains(&age), "born {born}, age {age}");
        }
    }

    #[test]
    fn seed_inserts_requested_rows() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PersonRepository::new(dir.path().join("crud.db"));

        let inserted = seed(&repo, 50).unwrap();
        assert_eq!(repo.count().unwrap(), inserted);
        assert!(inserted >= 49);

        for person in repo.list_all().unwrap() {
            assert!(is_valid_cpf(person.national_id.as_deref().unwrap()));
            assert_eq!(person.birth_date.as_deref().unwrap().len(), 10);
        }
    }
}
