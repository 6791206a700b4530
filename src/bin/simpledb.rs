//! Line oriented SQL shell over a database directory.

use structopt::StructOpt;

use std::{
    io::{self, BufRead, Write},
    path,
};

use simpledb::{Result, SimpleDB};

#[derive(StructOpt)]
#[structopt(name = "simpledb", about = "teaching relational database shell")]
struct Opt {
    /// Database directory, created if absent.
    #[structopt(parse(from_os_str))]
    dir: path::PathBuf,
}

fn main() {
    let opts = Opt::from_args();
    match run(&opts) {
        Ok(()) => (),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    }
}

fn run(opts: &Opt) -> Result<()> {
    let db = SimpleDB::open(&opts.dir)?;
    let stdin = io::stdin();

    print_prompt();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let statement = line.trim();
        if statement.is_empty() {
            print_prompt();
            continue;
        }
        if statement == "quit" || statement == "exit" {
            break;
        }

        if statement.to_lowercase().starts_with("select") {
            do_query(&db, statement);
        } else {
            do_update(&db, statement);
        }
        print_prompt();
    }

    Ok(())
}

fn do_query(db: &SimpleDB, statement: &str) {
    let mut tx = match db.new_tx() {
        Ok(tx) => tx,
        Err(err) => return eprintln!("error: {}", err),
    };

    let res = || -> Result<()> {
        let plan = db.create_query_plan(statement, &mut tx)?;
        let fields: Vec<String> = plan.schema().fields().to_vec();
        println!("{}", fields.join(" | "));

        let mut scan = plan.open(&mut tx)?;
        scan.before_first(&mut tx)?;
        while scan.next(&mut tx)? {
            let mut row = vec![];
            for field in fields.iter() {
                row.push(scan.get_val(&mut tx, field)?.to_string());
            }
            println!("{}", row.join(" | "));
        }
        scan.close(&mut tx)
    }();

    match res {
        Ok(()) => {
            tx.commit().ok();
        }
        Err(err) => {
            eprintln!("error: {}", err);
            tx.rollback().ok();
        }
    }
}

fn do_update(db: &SimpleDB, statement: &str) {
    let mut tx = match db.new_tx() {
        Ok(tx) => tx,
        Err(err) => return eprintln!("error: {}", err),
    };

    match db.execute_update(statement, &mut tx) {
        Ok(count) => {
            tx.commit().ok();
            println!("{} records affected", count);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            tx.rollback().ok();
        }
    }
}

fn print_prompt() {
    print!("sql> ");
    io::stdout().flush().ok();
}
