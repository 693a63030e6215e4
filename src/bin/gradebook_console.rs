//! Gradebook Console
//!
//! An interactive menu over an in-memory store: add, list, find, update,
//! and delete records from a terminal. Records live only for the session.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use gradebook::{
    CancelToken, GradeScale, Gradebook, InMemoryStudentStore, StudentDraft, StudentRecord,
    MAX_SCORE, MIN_SCORE,
};

fn main() {
    let engine = Gradebook::new(
        Arc::new(InMemoryStudentStore::new()),
        GradeScale::default(),
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("gradebook console (in-memory, scale: five-tier)");

    loop {
        println!();
        println!("1) add student");
        println!("2) list students");
        println!("3) find student");
        println!("4) update student");
        println!("5) delete student");
        println!("6) quit");

        let Some(choice) = prompt(&mut input, "> ") else {
            break;
        };

        let done = match choice.trim() {
            "1" => add_student(&engine, &mut input),
            "2" => list_students(&engine),
            "3" => find_student(&engine, &mut input),
            "4" => update_student(&engine, &mut input),
            "5" => delete_student(&engine, &mut input),
            "6" | "q" => break,
            other => {
                eprintln!("unknown choice: {other}");
                false
            }
        };

        // EOF inside a sub-prompt ends the session too.
        if done {
            break;
        }
    }

    println!("bye");
}

/// Print a prompt and read one line. `None` means EOF.
fn prompt(input: &mut impl BufRead, label: &str) -> Option<String> {
    print!("{label}");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Prompt for a mark until the caller types an in-range integer.
fn prompt_score(input: &mut impl BufRead, subject: &str) -> Option<i32> {
    loop {
        let raw = prompt(input, &format!("{subject} mark ({MIN_SCORE}-{MAX_SCORE}): "))?;
        match raw.parse::<i32>() {
            Ok(value) => return Some(value),
            Err(_) => eprintln!("not a number: {raw}"),
        }
    }
}

fn print_record(record: &StudentRecord) {
    let email = record.email.as_deref().unwrap_or("-");
    println!(
        "{}  {}  email={}  english={} maths={} science={}  total={}  average={:.2}  grade={}",
        record.id,
        record.name,
        email,
        record.english,
        record.maths,
        record.science,
        record.total,
        record.average,
        record.grade,
    );
}

fn read_draft(input: &mut impl BufRead, id: String) -> Option<StudentDraft> {
    let name = prompt(input, "name: ")?;
    let email = prompt(input, "email (blank for none): ")?;
    let english = prompt_score(input, "english")?;
    let maths = prompt_score(input, "maths")?;
    let science = prompt_score(input, "science")?;

    Some(StudentDraft {
        id,
        name,
        email: if email.is_empty() { None } else { Some(email) },
        english,
        maths,
        science,
    })
}

/// Each action returns true when input hit EOF.
fn add_student(engine: &Gradebook, input: &mut impl BufRead) -> bool {
    let Some(id) = prompt(input, "id: ") else {
        return true;
    };
    let Some(draft) = read_draft(input, id) else {
        return true;
    };

    match engine.create(&draft, &CancelToken::new()) {
        Ok(record) => {
            println!("added:");
            print_record(&record);
        }
        Err(err) => eprintln!("error: {err}"),
    }
    false
}

fn list_students(engine: &Gradebook) -> bool {
    match engine.list(&CancelToken::new()) {
        Ok(records) if records.is_empty() => println!("no students yet"),
        Ok(records) => {
            for record in &records {
                print_record(record);
            }
        }
        Err(err) => eprintln!("error: {err}"),
    }
    false
}

fn find_student(engine: &Gradebook, input: &mut impl BufRead) -> bool {
    let Some(id) = prompt(input, "id: ") else {
        return true;
    };

    match engine.fetch(&id, &CancelToken::new()) {
        Ok(record) => print_record(&record),
        Err(err) => eprintln!("error: {err}"),
    }
    false
}

fn update_student(engine: &Gradebook, input: &mut impl BufRead) -> bool {
    let Some(id) = prompt(input, "id: ") else {
        return true;
    };
    let Some(draft) = read_draft(input, String::new()) else {
        return true;
    };

    match engine.update(&id, &draft, &CancelToken::new()) {
        Ok(record) => {
            println!("updated:");
            print_record(&record);
        }
        Err(err) => eprintln!("error: {err}"),
    }
    false
}

fn delete_student(engine: &Gradebook, input: &mut impl BufRead) -> bool {
    let Some(id) = prompt(input, "id: ") else {
        return true;
    };

    match engine.remove(&id, &CancelToken::new()) {
        Ok(()) => println!("deleted {id}"),
        Err(err) => eprintln!("error: {err}"),
    }
    false
}
