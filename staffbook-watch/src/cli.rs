use std::net::SocketAddr;
use std::process;

use getopts::Options;
use tokio::time::Duration;

pub struct Args {
    pub address: SocketAddr,
    pub once: bool,
    pub interval: Option<Duration>,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optflag(
        "o",
        "once",
        "Run a single check, print the report as JSON and exit",
    );
    opts.optopt(
        "i",
        "interval",
        "Run a check every SECONDS while serving, starting immediately",
        "SECONDS",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
    {
        Ok(address) => address,
        Err(err) => {
            eprintln!("Provided value for option 'address' is invalid: {err}");
            process::exit(1);
        }
    };

    let once = matches.opt_present("once");

    let interval = match matches.opt_get::<u64>("interval") {
        Ok(Some(0)) => {
            eprintln!("Provided value for option 'interval' must be at least 1 second");
            process::exit(1);
        }
        Ok(secs) => secs.map(Duration::from_secs),
        Err(err) => {
            eprintln!("Provided value for option 'interval' is invalid: {err}");
            process::exit(1);
        }
    };

    Args {
        address,
        once,
        interval,
    }
}
