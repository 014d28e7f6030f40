//! First-boot scripts that install and start a backend application.

use super::{ProvisioningError, ProvisioningResult};
use crate::deployment::domain::AppRuntime;
use crate::shell::shell_escape;
use minijinja::{Environment, context};

const NODE_TEMPLATE: &str = r#"#!/bin/bash
set -e
exec > >(tee /var/log/user-data.log|logger -t user-data -s 2>/dev/console) 2>&1

echo "Starting deployment at $(date)"

apt-get update
DEBIAN_FRONTEND=noninteractive apt-get upgrade -y

curl -fsSL https://deb.nodesource.com/setup_20.x | bash -
apt-get install -y nodejs git build-essential
node --version
npm --version

cd /home/ubuntu
rm -rf app
git clone {{ repo_url }} app
cd app

npm install --production

cat > .env <<EOF
PORT={{ port }}
NODE_ENV=production
EOF

cat > /etc/systemd/system/app.service <<EOF
[Unit]
Description=Backend Application
After=network.target

[Service]
Type=simple
User=ubuntu
WorkingDirectory=/home/ubuntu/app
Environment=PORT={{ port }}
Environment=NODE_ENV=production
ExecStart=/usr/bin/npm start
Restart=always
RestartSec=10

[Install]
WantedBy=multi-user.target
EOF

chown -R ubuntu:ubuntu /home/ubuntu/app

systemctl daemon-reload
systemctl enable app
systemctl start app

sleep 10
systemctl status app --no-pager

echo "Deployment completed at $(date)"
"#;

const PYTHON_TEMPLATE: &str = r#"#!/bin/bash
set -e
exec > >(tee /var/log/user-data.log|logger -t user-data -s 2>/dev/console) 2>&1

echo "Starting Python deployment at $(date)"

apt-get update
DEBIAN_FRONTEND=noninteractive apt-get upgrade -y
apt-get install -y python3 python3-pip python3-venv git

cd /home/ubuntu
rm -rf app
git clone {{ repo_url }} app
cd app

python3 -m venv venv
source venv/bin/activate
pip install --upgrade pip
pip install -r requirements.txt

cat > /etc/systemd/system/app.service <<EOF
[Unit]
Description=Python Backend
After=network.target

[Service]
Type=simple
User=ubuntu
WorkingDirectory=/home/ubuntu/app
Environment=PORT={{ port }}
ExecStart=/home/ubuntu/app/venv/bin/python app.py
Restart=always
RestartSec=10

[Install]
WantedBy=multi-user.target
EOF

chown -R ubuntu:ubuntu /home/ubuntu/app

systemctl daemon-reload
systemctl enable app
systemctl start app

sleep 10
systemctl status app --no-pager

echo "Python deployment completed at $(date)"
"#;

/// Renders the boot script for a runtime.
///
/// The repository URL is shell-quoted before it is embedded. The resulting
/// script installs the runtime, clones the repository, installs
/// dependencies and registers a restart-always `app` systemd unit bound to
/// `port`.
///
/// # Errors
///
/// Returns [`ProvisioningError::BootScript`] when the template fails to
/// render.
pub fn render_boot_script(
    runtime: AppRuntime,
    repo_url: &str,
    port: u16,
) -> ProvisioningResult<String> {
    let template = match runtime {
        AppRuntime::Node => NODE_TEMPLATE,
        AppRuntime::Python => PYTHON_TEMPLATE,
    };
    let mut environment = Environment::new();
    environment.set_keep_trailing_newline(true);
    environment
        .render_str(
            template,
            context! { repo_url => shell_escape(repo_url), port => port },
        )
        .map_err(ProvisioningError::boot_script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppRuntime::Node, "ExecStart=/usr/bin/npm start")]
    #[case(AppRuntime::Python, "ExecStart=/home/ubuntu/app/venv/bin/python app.py")]
    fn selects_template_by_runtime(#[case] runtime: AppRuntime, #[case] exec_line: &str) {
        let script = render_boot_script(runtime, "https://github.com/acme/api", 8080)
            .expect("template should render");

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains(exec_line));
        assert!(script.contains("Environment=PORT=8080"));
        assert!(script.contains("Restart=always"));
        assert!(script.contains("git clone 'https://github.com/acme/api' app"));
    }

    #[test]
    fn node_script_writes_port_into_env_file() {
        let script = render_boot_script(AppRuntime::Node, "https://x/y", 3000)
            .expect("template should render");
        assert!(script.contains("PORT=3000\nNODE_ENV=production\nEOF"));
    }

    #[test]
    fn hostile_repository_url_stays_quoted() {
        let script = render_boot_script(AppRuntime::Python, "https://x/$(reboot)'; rm -rf /", 5000)
            .expect("template should render");
        assert!(script.contains("git clone 'https://x/$(reboot)'\\''; rm -rf /' app"));
    }
}
