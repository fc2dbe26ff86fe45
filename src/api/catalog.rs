//! Fixture data for the development stub
//!
//! A small film catalog, a genre-overlap recommender over it and a canned
//! chat table. None of this is meant to be a real recommendation engine.

use std::collections::HashSet;

use crate::models::{Movie, RecommendedItem, TitleKey, WatchlistEntry};

pub const MAX_RECOMMENDATIONS: usize = 20;

pub const EMPTY_WATCHLIST_MESSAGE: &str =
    "No recommendations yet. Add a few more movies with genres you enjoy.";

pub const DEFAULT_CHAT_REPLY: &str = "Sorry, I didn't quite get that. Could you rephrase?";

const SEED: &[(&str, &str, &str)] = &[
    ("Inception", "Action, Science Fiction, Thriller", "A thief who steals secrets through dreams takes on one last job."),
    ("The Dark Knight", "Action, Crime, Drama", "Batman faces the Joker in a fight for Gotham's soul."),
    ("The Matrix", "Action, Science Fiction", "A hacker learns the world he knows is a simulation."),
    ("Heat", "Action, Crime, Drama, Thriller", "A detective and a master thief circle each other across Los Angeles."),
    ("Ronin", "Action, Crime, Thriller", "Mercenaries are hired to steal a mysterious case."),
    ("Alien", "Horror, Science Fiction", "A commercial crew answers a distress call and finds something deadly."),
    ("Get Out", "Horror, Mystery, Thriller", "A weekend visit to his girlfriend's family turns sinister."),
    ("The Conjuring", "Horror, Thriller", "Paranormal investigators help a family terrorized in their farmhouse."),
    ("Ex Machina", "Drama, Science Fiction", "A programmer evaluates the consciousness of a humanoid AI."),
    ("The Shawshank Redemption", "Crime, Drama", "Two imprisoned men bond over years, finding redemption."),
    ("Forrest Gump", "Comedy, Drama, Romance", "A kind man witnesses decades of American history."),
    ("Titanic", "Drama, Romance", "A young aristocrat falls for an artist aboard a doomed liner."),
    ("Superbad", "Comedy", "Two friends try to make the most of their last weeks of high school."),
    ("The Hangover", "Comedy", "Three groomsmen retrace a night in Las Vegas to find the groom."),
    ("Arrival", "Drama, Mystery, Science Fiction", "A linguist works to communicate with visitors from space."),
];

const CANNED_REPLIES: &[(&str, &str)] = &[
    ("hello", "Hello! How can I assist you today?"),
    ("hi", "Hi there! What can I do for you?"),
    ("hey", "Hey! Need any help?"),
    ("bye", "Goodbye! Have a great day!"),
    ("thank you", "You're welcome! Happy to help."),
    ("thanks", "No problem! Let me know if you need anything else."),
    ("how are you", "I'm just a bot, but I'm functioning as expected!"),
    ("what is your name", "I'm MovieBot, your personal movie assistant."),
    ("recommend a movie", "Sure! Have you seen **Inception** or *The Dark Knight*? They're great choices!"),
    ("suggest a comedy", "You might enjoy *The Hangover* or *Superbad* for some laughs."),
    ("suggest a drama", "Consider watching *The Shawshank Redemption* or *Forrest Gump*."),
    ("suggest a horror", "If you're into horror, *Get Out* and *The Conjuring* are popular picks."),
    ("who directed inception", "Christopher Nolan directed *Inception*."),
    ("when was titanic released", "*Titanic* was released in 1997."),
];

/// Builds the seed catalog
pub fn seed_catalog() -> Vec<Movie> {
    SEED.iter()
        .map(|(title, genres, overview)| Movie {
            title: title.to_string(),
            poster_path: Some(format!("/posters/{}.jpg", slug(title))),
            genres: Some(genres.to_string()),
            overview: Some(overview.to_string()),
        })
        .collect()
}

fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn genre_set(genres: Option<&str>) -> HashSet<String> {
    genres
        .unwrap_or_default()
        .split(',')
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

/// Looks up a catalog movie by normalized title
pub fn find<'a>(catalog: &'a [Movie], title: &str) -> Option<&'a Movie> {
    let key = TitleKey::new(title);
    catalog.iter().find(|movie| movie.key() == key)
}

/// Catalog movies sharing a genre with `genres`, best overlap first
fn by_overlap<'a>(
    catalog: &'a [Movie],
    genres: &HashSet<String>,
    exclude: &HashSet<TitleKey>,
) -> Vec<(&'a Movie, Vec<String>)> {
    let mut scored: Vec<_> = catalog
        .iter()
        .filter(|movie| !exclude.contains(&movie.key()))
        .filter_map(|movie| {
            let shared: Vec<String> = movie
                .genres
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|g| genres.contains(&g.to_lowercase()))
                .map(str::to_string)
                .collect();
            (!shared.is_empty()).then_some((movie, shared))
        })
        .collect();

    scored.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    scored.truncate(MAX_RECOMMENDATIONS);
    scored
}

fn to_item(movie: &Movie, reason: String) -> RecommendedItem {
    RecommendedItem {
        title: movie.title.clone(),
        poster_path: movie.poster_path.clone(),
        overview: movie.overview.clone(),
        genres: movie.genres.clone(),
        reason: Some(reason),
    }
}

/// Recommendations seeded by a single catalog title, or `None` if unknown
pub fn recommend_for_title(catalog: &[Movie], title: &str) -> Option<Vec<RecommendedItem>> {
    let seed = find(catalog, title)?;
    let exclude = HashSet::from([seed.key()]);

    let items = by_overlap(catalog, &genre_set(seed.genres.as_deref()), &exclude)
        .into_iter()
        .map(|(movie, _)| to_item(movie, format!("Because you liked {}", seed.title)))
        .collect();
    Some(items)
}

/// Recommendations from a whole watchlist, excluding titles already on it
pub fn recommend_for_watchlist(
    catalog: &[Movie],
    entries: &[WatchlistEntry],
) -> Vec<RecommendedItem> {
    let exclude: HashSet<TitleKey> = entries.iter().map(WatchlistEntry::key).collect();
    let genres: HashSet<String> = entries
        .iter()
        .flat_map(|entry| {
            let genres = entry
                .genres
                .as_deref()
                .or_else(|| find(catalog, &entry.title).and_then(|m| m.genres.as_deref()));
            genre_set(genres)
        })
        .collect();

    by_overlap(catalog, &genres, &exclude)
        .into_iter()
        .map(|(movie, shared)| {
            to_item(movie, format!("Shares {} with your watchlist", shared.join(", ")))
        })
        .collect()
}

/// Canned reply for a chat message; the longest matching phrase wins
pub fn chat_reply(message: &str) -> &'static str {
    let words: Vec<String> = message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    CANNED_REPLIES
        .iter()
        .filter(|(phrase, _)| {
            let phrase: Vec<&str> = phrase.split(' ').collect();
            words
                .windows(phrase.len())
                .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
        })
        .max_by_key(|(phrase, _)| phrase.len())
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_CHAT_REPLY)
}
