/*
 * Copyright (c) 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

use rs_hungarian::assignment::{Cost, Parallelism};
use rs_hungarian::dimacs;
use std::error::Error;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::result::Result;
use std::str::FromStr;

use rustop::opts;
use time::OffsetDateTime;

fn run<T>(filename: &str, par: Parallelism) -> Result<(), Box<dyn Error>>
where
    T: Cost + FromStr + Display,
    T::Err: Display,
{
    let tstart = OffsetDateTime::now_utc();
    let instance = dimacs::asn::read_from_file::<T>(filename)?;
    let tend = OffsetDateTime::now_utc();

    println!("Instance            : {}", filename);
    println!("Read Time (seconds) : {}", (tend - tstart).as_seconds_f64());
    println!("Value type          : {}", std::any::type_name::<T>());
    println!("Number of rows      : {}", instance.num_rows());
    println!("Number of columns   : {}", instance.num_cols());
    println!("Number of arcs      : {}", instance.arcs.len());
    println!("Number of workers   : {}", par.num_workers());

    let tstart = OffsetDateTime::now_utc();
    let (value, pairs) = instance.solve(par);
    let tend = OffsetDateTime::now_utc();
    let soltime = (tend - tstart).as_seconds_f64();

    println!();
    println!("Value               : {}", value);
    println!("Assigned pairs      : {}", pairs.len());
    println!("Time (seconds)      : {:.2}", soltime);
    println!();
    println!("Write solution to   : {}.sol", filename);

    let solfile = PathBuf::from(format!("{}.sol", filename));
    let f = &mut std::fs::File::create(&solfile)?;
    let fname = solfile
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "".into());
    writeln!(f, "c Solved with the Hungarian method")?;
    writeln!(f, "c instance            : {}", fname)?;
    writeln!(f, "c solution time       : {:.2} seconds", soltime)?;
    dimacs::asn::write_solution(f, value, &pairs)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let (args, _) = opts! {
        synopsis "Solve an assignment problem with the Hungarian method.";
        param file:String, desc:"Instance file name";
        opt threads:usize=0, desc:"Number of threads in the rayon pool (0 = rayon default)";
        opt sequential:bool, desc:"Run on the calling thread only";
        opt floating_point:bool, desc:"Use floating point values";
    }
    .parse_or_exit();

    // one worker per thread of the pool
    let par = if args.sequential {
        Parallelism::None
    } else {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
        Parallelism::Rayon(0)
    };

    if args.floating_point {
        run::<f64>(&args.file, par)
    } else {
        run::<isize>(&args.file, par)
    }
}
